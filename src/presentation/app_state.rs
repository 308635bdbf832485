// Application state for HTTP handlers
use crate::application::extremum_service::ExtremumService;
use crate::application::log_service::LogService;
use crate::application::plot_service::PlotService;

#[derive(Clone)]
pub struct AppState {
    pub plot_service: PlotService,
    pub extremum_service: ExtremumService,
    pub log_service: LogService,
}

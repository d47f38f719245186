use drivehub_core::{BookingService, Collaborators, FleetService};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
    pub fleet: FleetService,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(ctx: Collaborators, auth: AuthConfig) -> Self {
        Self {
            bookings: BookingService::new(ctx.clone()),
            fleet: FleetService::new(ctx),
            auth,
        }
    }
}

mod health_ui;

pub use health_ui::HealthUi;

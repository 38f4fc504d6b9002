pub mod accessibility;
pub mod session;
mod state;
pub mod storage;
pub mod theme;
mod ui;

pub use accessibility::{AccessibilitySettings, Feature};
pub use session::{DashboardSession, Kpi, Section};
pub use state::{App, AppWrapper};
pub use storage::{JsonFileStore, MemoryStore, Storage};
pub use theme::{ThemeController, ThemeHooks, ThemeIcon, THEME_KEY};

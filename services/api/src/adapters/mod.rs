pub mod db;
pub mod fixtures;
pub mod mock;

pub use db::PgInspectionRepository;
pub use fixtures::{load_form_registry, load_mock_repository};
pub use mock::MockInspectionRepository;

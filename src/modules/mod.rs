pub mod books;

use bookstore_db::Database;
use bookstore_kernel::ModuleRegistry;
use std::sync::Arc;

use books::repository::SqliteBookRepository;

/// Register all service modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    let repository = Arc::new(SqliteBookRepository::new(db.clone()));
    registry.register(books::create_module(repository));
}

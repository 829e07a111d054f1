pub mod books;

use std::sync::Arc;

use shelf_db::Database;
use shelf_kernel::ModuleRegistry;

/// Register every catalog module with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    let store = Arc::new(books::store::SqliteBookStore::new(db.clone()));
    registry.register(books::create_module(store));
}

pub mod entity;
pub mod manager;
pub mod memory;
pub mod pg;
pub mod query_builder;
pub mod repository;

use tracing::info;

pub use entity::{key_filter, Entity};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryRepository;
pub use pg::PgRepository;
pub use repository::{Page, Repository, MAX_PAGE_SIZE};

use crate::models::{villa::sample_villas, Villa};

/// Insert the sample villas when the villa table is empty.
/// Returns how many were inserted.
pub async fn seed_villas(villas: &dyn Repository<Villa>) -> Result<usize, DatabaseError> {
    if villas.count(None).await? > 0 {
        return Ok(0);
    }

    let samples = sample_villas();
    let inserted = samples.len();
    for dto in samples {
        villas.create(Villa::from(dto)).await?;
    }
    info!("Seeded {} sample villas", inserted);
    Ok(inserted)
}

//! Sample data for local development: one agent and a few buyers.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::buyers::queries::create_buyer;
use crate::buyers::validation::BuyerInput;
use crate::models::buyer::{BuyerPriority, BuyerStatus};
use crate::models::user::User;

pub const SEED_USER_EMAIL: &str = "test@example.com";
pub const SEED_USER_NAME: &str = "Test User";

#[allow(clippy::too_many_arguments)]
fn sample(
    first_name: &str,
    last_name: &str,
    phone: &str,
    status: BuyerStatus,
    priority: BuyerPriority,
    budget: i64,
    location: &str,
    notes: &str,
    tags: &[&str],
    assigned_to: Uuid,
) -> BuyerInput {
    BuyerInput {
        first_name: first_name.into(),
        last_name: last_name.into(),
        email: format!(
            "{}.{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        ),
        phone: Some(phone.into()),
        status,
        priority,
        budget: Some(budget),
        location: Some(location.into()),
        notes: Some(notes.into()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        assigned_to: Some(assigned_to),
    }
}

pub fn sample_buyers(assigned_to: Uuid) -> Vec<BuyerInput> {
    vec![
        sample(
            "John",
            "Doe",
            "555-123-4567",
            BuyerStatus::New,
            BuyerPriority::Medium,
            500_000,
            "New York, NY",
            "Looking for a 3-bedroom house",
            &["first-time", "pre-approved"],
            assigned_to,
        ),
        sample(
            "Jane",
            "Smith",
            "555-987-6543",
            BuyerStatus::Contacted,
            BuyerPriority::High,
            750_000,
            "San Francisco, CA",
            "Interested in waterfront properties",
            &["investor", "cash-buyer"],
            assigned_to,
        ),
        sample(
            "Robert",
            "Johnson",
            "555-456-7890",
            BuyerStatus::Qualified,
            BuyerPriority::Medium,
            350_000,
            "Chicago, IL",
            "Looking for a condo downtown",
            &["downsizing"],
            assigned_to,
        ),
    ]
}

/// Inserts the test user (or renames an existing one) and the sample buyers,
/// each with a `created` history entry.
pub async fn run(pool: &PgPool) -> Result<()> {
    info!("Seeding database...");

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(SEED_USER_EMAIL)
    .bind(SEED_USER_NAME)
    .fetch_one(pool)
    .await?;
    info!("Created test user: {}", user.email);

    for input in sample_buyers(user.id) {
        create_buyer(pool, &input, Some(user.id)).await?;
    }
    info!("Created sample buyers");

    info!("Seed completed successfully");
    Ok(())
}

//! Database seeder for Tally development and testing.
//!
//! Seeds a demo user with the starter invoices, a credit card billed to the
//! first of them and a few expenses, then prints an access token for that
//! user. Running it again reuses what already exists.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tally_core::invoice::PaymentMethodKind;
use tally_core::transaction::{TransactionDraft, TransactionStatus, TransactionType};
use tally_db::repositories::{
    CreatePaymentMethodInput, InvoiceLimitRepository, InvoiceRepository, PaymentMethodRepository,
    TransactionRepository, UserRepository,
};
use tally_shared::types::{InvoiceId, PaymentMethodId};
use tally_shared::{AppConfig, JwtConfig, JwtService};
use uuid::Uuid;

const DEMO_EMAIL: &str = "demo@tally.dev";
const DEMO_CARD: &str = "Demo Credit Card";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = tally_db::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding demo user...");
    let user_id = seed_user(&db).await?;

    println!("Seeding default invoices...");
    let invoice_id = seed_invoices(&db, user_id).await?;

    println!("Seeding credit card...");
    let card_id = seed_card(&db, user_id, invoice_id).await?;

    println!("Seeding expenses...");
    seed_expenses(&db, user_id, invoice_id, card_id).await?;

    let jwt = JwtService::new(JwtConfig::from(&config.jwt));
    let token = jwt
        .generate_access_token(user_id)
        .context("Failed to sign access token")?;

    println!("Seeding complete!");
    println!("  user:  {DEMO_EMAIL} ({user_id})");
    println!("  token: {token}");
    Ok(())
}

async fn seed_user(db: &DatabaseConnection) -> anyhow::Result<Uuid> {
    let repo = UserRepository::new(db.clone());
    if let Some(user) = repo.find_by_email(DEMO_EMAIL).await? {
        println!("  Demo user already exists, skipping...");
        return Ok(user.id);
    }

    let user = repo.create(DEMO_EMAIL, "Demo User").await?;
    Ok(user.id)
}

/// Creates the starter invoices and gives the first one a 5000 limit.
async fn seed_invoices(db: &DatabaseConnection, user_id: Uuid) -> anyhow::Result<Uuid> {
    let invoices = InvoiceRepository::new(db.clone());
    let created = invoices.create_defaults(user_id).await?;
    println!("  {} invoice(s) created", created.len());

    let first = invoices
        .list(user_id, false)
        .await?
        .into_iter()
        .min_by_key(|invoice| invoice.order)
        .context("User has no invoices")?;
    let invoice_id = first.id.into_inner();

    if first.credit_limit.is_none() {
        InvoiceLimitRepository::new(db.clone())
            .update_credit_limit(user_id, invoice_id, Decimal::new(5000, 0))
            .await?;
        println!("  Credit limit of 5000 set on '{}'", first.name);
    }

    Ok(invoice_id)
}

async fn seed_card(
    db: &DatabaseConnection,
    user_id: Uuid,
    invoice_id: Uuid,
) -> anyhow::Result<Uuid> {
    let repo = PaymentMethodRepository::new(db.clone());
    if let Some(card) = repo
        .list(user_id)
        .await?
        .into_iter()
        .find(|method| method.name == DEMO_CARD)
    {
        println!("  Credit card already exists, skipping...");
        return Ok(card.id);
    }

    let card = repo
        .create(
            user_id,
            CreatePaymentMethodInput {
                name: DEMO_CARD.to_string(),
                kind: PaymentMethodKind::CreditCard,
                last_four_digits: Some("4242".to_string()),
                invoice_id: Some(invoice_id),
                color: None,
                icon: None,
                order: None,
            },
        )
        .await?;
    Ok(card.id)
}

/// Adds a plain purchase and a three-installment one, once.
async fn seed_expenses(
    db: &DatabaseConnection,
    user_id: Uuid,
    invoice_id: Uuid,
    card_id: Uuid,
) -> anyhow::Result<()> {
    let limits = InvoiceLimitRepository::new(db.clone());
    let info = limits.limit_info(user_id, invoice_id).await?;
    if info.used > Decimal::ZERO {
        println!("  Expenses already exist, skipping...");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let repo = TransactionRepository::new(db.clone());
    let purchases = [
        ("Groceries", Decimal::new(23450, 2), 1),
        ("Headphones", Decimal::new(90000, 2), 3),
    ];

    for (description, amount, installments) in purchases {
        let draft = TransactionDraft {
            description: description.to_string(),
            amount,
            transaction_type: TransactionType::Expense,
            status: TransactionStatus::Completed,
            transaction_date: today.with_day(1).unwrap_or(today),
            due_date: None,
            installments_current: None,
            installments_total: (installments > 1).then_some(installments),
            notes: None,
            category_id: None,
            payment_method_id: Some(PaymentMethodId::from_uuid(card_id)),
            invoice_id: Some(InvoiceId::from_uuid(invoice_id)),
        };
        repo.create(user_id, draft).await?;
        println!("  {description}: {amount}");
    }

    Ok(())
}

//! Initial database migration.
//!
//! Creates the enums and tables backing invoices, their shared credit
//! limit, payment methods and transactions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: INVOICES & CREDIT LIMIT
        // ============================================================
        db.execute_unprepared(INVOICES_SQL).await?;

        // ============================================================
        // PART 4: PAYMENT METHODS
        // ============================================================
        db.execute_unprepared(PAYMENT_METHODS_SQL).await?;

        // ============================================================
        // PART 5: TRANSACTIONS
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Invoice lifecycle
CREATE TYPE invoice_status AS ENUM ('open', 'closed', 'paid', 'overdue', 'pending');

-- Transaction direction and settlement
CREATE TYPE transaction_type AS ENUM ('income', 'expense');
CREATE TYPE transaction_status AS ENUM ('pending', 'completed', 'canceled');

-- Payment method kinds
CREATE TYPE payment_method_type AS ENUM (
    'credit_card',
    'debit_card',
    'pix',
    'cash',
    'bank_transfer',
    'other'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_email ON users(email) WHERE is_active = true;
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    description VARCHAR(255),
    closing_day SMALLINT NOT NULL,
    due_day SMALLINT NOT NULL,
    status invoice_status NOT NULL DEFAULT 'open',

    -- Shared credit limit
    credit_limit NUMERIC(12, 2),
    used_limit NUMERIC(12, 2) NOT NULL DEFAULT 0,

    -- Billing cycle
    total_amount NUMERIC(12, 2),
    closing_date DATE,
    due_date DATE,
    payment_date DATE,

    color VARCHAR(7) NOT NULL DEFAULT '#6B7280',
    icon VARCHAR(10) NOT NULL DEFAULT '📄',
    display_order INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_invoice_closing_day CHECK (closing_day BETWEEN 1 AND 31),
    CONSTRAINT chk_invoice_due_day CHECK (due_day BETWEEN 1 AND 31),
    CONSTRAINT chk_invoice_credit_limit_positive CHECK (credit_limit IS NULL OR credit_limit > 0),
    CONSTRAINT chk_invoice_used_limit_non_negative CHECK (used_limit >= 0),
    CONSTRAINT chk_invoice_used_within_limit CHECK (credit_limit IS NULL OR used_limit <= credit_limit)
);

CREATE UNIQUE INDEX idx_invoices_user_name ON invoices(user_id, name) WHERE is_active = true;
CREATE INDEX idx_invoices_user_order ON invoices(user_id, display_order) WHERE is_active = true;
CREATE INDEX idx_invoices_status ON invoices(status) WHERE is_active = true;
";

const PAYMENT_METHODS_SQL: &str = r"
CREATE TABLE payment_methods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    kind payment_method_type NOT NULL,
    last_four_digits VARCHAR(4),
    invoice_id UUID REFERENCES invoices(id) ON DELETE SET NULL,
    color VARCHAR(7) NOT NULL DEFAULT '#6B7280',
    icon VARCHAR(10) NOT NULL DEFAULT '💳',
    display_order INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_payment_method_last_four CHECK (last_four_digits IS NULL OR last_four_digits ~ '^[0-9]{4}$'),
    CONSTRAINT chk_payment_method_invoice_kind CHECK (invoice_id IS NULL OR kind = 'credit_card')
);

CREATE UNIQUE INDEX idx_payment_methods_user_name ON payment_methods(user_id, name) WHERE is_active = true;
CREATE INDEX idx_payment_methods_invoice ON payment_methods(invoice_id) WHERE invoice_id IS NOT NULL;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    description VARCHAR(255) NOT NULL,
    amount NUMERIC(12, 2) NOT NULL,
    transaction_type transaction_type NOT NULL,
    status transaction_status NOT NULL DEFAULT 'completed',
    transaction_date DATE NOT NULL,
    due_date DATE,
    installments_current SMALLINT NOT NULL DEFAULT 1,
    installments_total SMALLINT NOT NULL DEFAULT 1,
    notes VARCHAR(500),
    category_id UUID,
    payment_method_id UUID REFERENCES payment_methods(id) ON DELETE SET NULL,
    invoice_id UUID REFERENCES invoices(id) ON DELETE SET NULL,
    parent_transaction_id UUID REFERENCES transactions(id) ON DELETE CASCADE,

    -- Amount this row currently holds against its invoice's credit limit
    limit_reserved NUMERIC(12, 2) NOT NULL DEFAULT 0,

    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_transaction_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transaction_due_after_date CHECK (due_date IS NULL OR due_date >= transaction_date),
    CONSTRAINT chk_transaction_installments CHECK (
        installments_total >= 1 AND installments_current BETWEEN 1 AND installments_total
    ),
    CONSTRAINT chk_transaction_invoice_expense CHECK (invoice_id IS NULL OR transaction_type = 'expense'),
    CONSTRAINT chk_transaction_reserved CHECK (limit_reserved >= 0 AND limit_reserved <= amount)
);

CREATE INDEX idx_transactions_user_date ON transactions(user_id, transaction_date) WHERE is_active = true;
CREATE INDEX idx_transactions_invoice ON transactions(invoice_id) WHERE invoice_id IS NOT NULL;
CREATE INDEX idx_transactions_parent ON transactions(parent_transaction_id)
    WHERE parent_transaction_id IS NOT NULL;
";

const DROP_ALL_SQL: &str = r"
-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS payment_methods CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS users CASCADE;

-- Drop enums
DROP TYPE IF EXISTS payment_method_type CASCADE;
DROP TYPE IF EXISTS transaction_status CASCADE;
DROP TYPE IF EXISTS transaction_type CASCADE;
DROP TYPE IF EXISTS invoice_status CASCADE;
";

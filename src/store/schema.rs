pub const SCHEMA: &str = r#"
-- Catalog products; everything beyond the key lives in the attributes JSON
CREATE TABLE IF NOT EXISTS watches (
    id TEXT PRIMARY KEY,
    attributes TEXT NOT NULL DEFAULT '{}'
);

-- Purchase orders; status stays NULL until an admin marks the order shipped
CREATE TABLE IF NOT EXISTS purchases (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,        -- owning customer, as asserted in the order
    status TEXT,                -- NULL = awaiting shipment
    attributes TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    attributes TEXT NOT NULL DEFAULT '{}'
);

-- User profiles, keyed by email; role 'admin' is the only privileged value
CREATE TABLE IF NOT EXISTS users (
    email TEXT PRIMARY KEY,
    role TEXT,                  -- NULL = customer
    attributes TEXT NOT NULL DEFAULT '{}'
);

-- Identity tokens are auth credentials bound to a user email
CREATE TABLE IF NOT EXISTS identity_tokens (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL REFERENCES users(email) ON DELETE CASCADE,
    token_hash TEXT NOT NULL,   -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL, -- short prefix for fast lookup
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,            -- NULL = never
    last_used_at TEXT
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_purchases_email ON purchases(email);
CREATE UNIQUE INDEX IF NOT EXISTS idx_identity_tokens_lookup ON identity_tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_identity_tokens_email ON identity_tokens(email);
"#;

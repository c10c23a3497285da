//! Outbox and inbox database schema.
//!
//! The authoritative copies live under `migrations/`; these constants exist
//! for embedded/test bootstrapping against a bare database.

/// SQL to create the integration-event outbox table.
pub const CREATE_OUTBOX_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS outbox_integration_events (
    id                         UUID PRIMARY KEY,
    event_name                 VARCHAR(255) NOT NULL,
    event_version              SMALLINT NOT NULL,
    payload                    JSONB NOT NULL,
    created_utc                TIMESTAMPTZ NOT NULL,
    processed_utc              TIMESTAMPTZ,
    do_not_process_before_utc  TIMESTAMPTZ,
    attempts                   INT NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_outbox_pending
    ON outbox_integration_events (created_utc)
    WHERE processed_utc IS NULL;
";

/// SQL to create the inbox table.
pub const CREATE_INBOX_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS inbox_messages (
    event_id       UUID NOT NULL,
    handler_name   VARCHAR(255) NOT NULL,
    processed_utc  TIMESTAMPTZ NOT NULL,
    attempts       INT NOT NULL DEFAULT 1,
    PRIMARY KEY (event_id, handler_name)
);
";

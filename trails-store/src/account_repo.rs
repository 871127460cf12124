use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trails_core::identity::{Account, AccountStore, NewAccount};
use trails_core::{CoreError, CoreResult};
use uuid::Uuid;

pub struct PgAccounts {
    pool: PgPool,
}

impl PgAccounts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> Account {
        Account {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }
}

fn store_error(err: sqlx::Error) -> CoreError {
    CoreError::StoreError(err.to_string())
}

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, email, phone, password_hash, created_at";

#[async_trait]
impl AccountStore for PgAccounts {
    async fn create(&self, new_account: NewAccount) -> CoreResult<Account> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, first_name, last_name, email, phone, password_hash, created_at)
            VALUES ($1, $2, $3, LOWER($4), $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&new_account.first_name)
        .bind(&new_account.last_name)
        .bind(&new_account.email)
        .bind(&new_account.phone)
        .bind(&new_account.password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Account {
                id,
                first_name: new_account.first_name,
                last_name: new_account.last_name,
                email: new_account.email.to_lowercase(),
                phone: new_account.phone,
                password_hash: new_account.password_hash,
                created_at,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CoreError::EmailTaken)
            }
            Err(err) => Err(store_error(err)),
        }
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(AccountRow::into_account))
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(AccountRow::into_account))
    }
}

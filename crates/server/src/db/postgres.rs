//! `PostgreSQL` implementation of [`Store`].
//!
//! Queries are checked at runtime (`sqlx::query_as` + `FromRow` row structs),
//! so the crate builds without a live database. Row structs mirror the SQL
//! schema and are converted into domain types at the boundary; anything that
//! fails domain validation surfaces as `RepositoryError::DataCorruption`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use cantina_core::{ConsumptionId, Email, Price, ProductId, Quantity, UserId};

use super::{RepositoryError, Store, StoreResult, conflict_on_unique};
use crate::models::{Consumption, LedgerEntry, NewProduct, NewUser, Product, ProfileUpdate, User};

const USER_COLUMNS: &str = "id, email, war_name, rank, company, phone, is_admin, password_hash, \
                            pix_key, qr_code_url, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, price, available, image_url, admin_id, created_at";

const LEDGER_SELECT: &str = "SELECT c.id, c.user_id, c.product_id, c.quantity, c.created_at, \
            p.name AS product_name, p.price AS product_price, \
            p.available AS product_available, p.image_url AS product_image_url, \
            p.admin_id AS product_admin_id, p.created_at AS product_created_at \
     FROM consumption c JOIN product p ON p.id = c.product_id";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    war_name: String,
    rank: String,
    company: String,
    phone: String,
    is_admin: bool,
    password_hash: Option<String>,
    pix_key: Option<String>,
    qr_code_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(r.id),
            email: Email::from_trusted(r.email),
            war_name: r.war_name,
            rank: r.rank,
            company: r.company,
            phone: r.phone,
            is_admin: r.is_admin,
            password_hash: r.password_hash,
            pix_key: r.pix_key,
            qr_code_url: r.qr_code_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    available: bool,
    image_url: Option<String>,
    admin_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(r.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", r.id))
        })?;
        Ok(Self {
            id: ProductId::from_uuid(r.id),
            name: r.name,
            price,
            available: r.available,
            image_url: r.image_url,
            admin_id: r.admin_id.map(UserId::from_uuid),
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ConsumptionRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ConsumptionRow> for Consumption {
    type Error = RepositoryError;

    fn try_from(r: ConsumptionRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(i64::from(r.quantity)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity for consumption {}: {e}", r.id))
        })?;
        Ok(Self {
            id: ConsumptionId::from_uuid(r.id),
            user_id: UserId::from_uuid(r.user_id),
            product_id: ProductId::from_uuid(r.product_id),
            quantity,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    #[sqlx(flatten)]
    consumption: ConsumptionRow,
    product_name: String,
    product_price: Decimal,
    product_available: bool,
    product_image_url: Option<String>,
    product_admin_id: Option<Uuid>,
    product_created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = RepositoryError;

    fn try_from(r: LedgerRow) -> Result<Self, Self::Error> {
        let product = Product::try_from(ProductRow {
            id: r.consumption.product_id,
            name: r.product_name,
            price: r.product_price,
            available: r.product_available,
            image_url: r.product_image_url,
            admin_id: r.product_admin_id,
            created_at: r.product_created_at,
        })?;
        Ok(Self {
            consumption: Consumption::try_from(r.consumption)?,
            product,
        })
    }
}

fn collect_entries(rows: Vec<LedgerRow>) -> StoreResult<Vec<LedgerEntry>> {
    rows.into_iter().map(LedgerEntry::try_from).collect()
}

/// Durable store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>> {
        // Email matches win over war-name matches; war names are not unique.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user \
             WHERE lower(email) = $1 OR lower(war_name) = $1 \
             ORDER BY (lower(email) = $1) DESC, created_at, id \
             LIMIT 1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE lower(email) = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO app_user \
                 (email, war_name, rank, company, phone, is_admin, password_hash, pix_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.email.as_str())
        .bind(&user.war_name)
        .bind(&user.rank)
        .bind(&user.company)
        .bind(&user.phone)
        .bind(user.is_admin)
        .bind(user.password_hash.as_deref())
        .bind(user.pix_key.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;
        Ok(row.into())
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE app_user SET \
                 war_name = $2, rank = $3, company = $4, phone = $5, \
                 pix_key = $6, qr_code_url = $7, \
                 password_hash = COALESCE($8, password_hash), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&update.war_name)
        .bind(&update.rank)
        .bind(&update.company)
        .bind(&update.phone)
        .bind(update.pix_key.as_deref())
        .bind(update.qr_code_url.as_deref())
        .bind(update.password_hash.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::from).ok_or(RepositoryError::NotFound)
    }

    async fn set_admin(&self, email: &Email, is_admin: bool) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE app_user SET is_admin = $2, updated_at = now() \
             WHERE lower(email) = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::from).ok_or(RepositoryError::NotFound)
    }

    async fn first_admin(&self) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE is_admin \
             ORDER BY created_at, id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn list_products(&self, include_unavailable: bool) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product \
             WHERE $1 OR available \
             ORDER BY seq"
        ))
        .bind(include_unavailable)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Product::try_from).transpose()
    }

    async fn create_product(&self, owner: UserId, product: NewProduct) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO product (name, price, available, image_url, admin_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.available)
        .bind(product.image_url.as_deref())
        .bind(owner.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        product: NewProduct,
    ) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE product SET \
                 name = $3, price = $4, available = $5, image_url = $6, \
                 admin_id = COALESCE(admin_id, $2) \
             WHERE id = $1 AND (admin_id IS NULL OR admin_id = $2) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.available)
        .bind(product.image_url.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete_product(&self, id: ProductId, owner: UserId) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM product WHERE id = $1 AND (admin_id IS NULL OR admin_id = $2)")
                .bind(id.as_uuid())
                .bind(owner.as_uuid())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_unowned_products(&self, admin: UserId) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE product SET admin_id = $1 WHERE admin_id IS NULL")
            .bind(admin.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_consumption(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> StoreResult<Consumption> {
        let row = sqlx::query_as::<_, ConsumptionRow>(
            "INSERT INTO consumption (user_id, product_id, quantity) \
             VALUES ($1, $2, $3) \
             RETURNING id, user_id, product_id, quantity, created_at",
        )
        .bind(user.as_uuid())
        .bind(product.as_uuid())
        .bind(quantity.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;
        row.try_into()
    }

    async fn list_consumptions_for_user(&self, user: UserId) -> StoreResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "{LEDGER_SELECT} WHERE c.user_id = $1 ORDER BY c.seq"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        collect_entries(rows)
    }

    async fn list_consumptions_for_admin(&self, admin: UserId) -> StoreResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "{LEDGER_SELECT} WHERE p.admin_id = $1 ORDER BY c.seq"
        ))
        .bind(admin.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        collect_entries(rows)
    }

    async fn delete_consumption(&self, id: ConsumptionId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM consumption WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_consumptions_for_user(&self, user: UserId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM consumption WHERE user_id = $1")
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

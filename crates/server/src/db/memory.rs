//! In-memory implementation of [`Store`].
//!
//! Rows live in insertion-ordered `Vec`s guarded by `tokio::sync::RwLock`, so
//! listing order matches what the Postgres backend returns (`ORDER BY seq`).
//! Not durable: state is lost on restart. Used by the test suites and by
//! `CANTINA_STORE=memory` for local development.
//!
//! Locks are always taken in the order users, products, consumptions.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use cantina_core::{ConsumptionId, Email, ProductId, Quantity, UserId};

use super::{RepositoryError, Store, StoreResult};
use crate::models::{Consumption, LedgerEntry, NewProduct, NewUser, Product, ProfileUpdate, User};

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    products: RwLock<Vec<Product>>,
    consumptions: RwLock<Vec<Consumption>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn join(
    consumptions: &[Consumption],
    products: &[Product],
    keep: impl Fn(&Consumption, &Product) -> bool,
) -> Vec<LedgerEntry> {
    consumptions
        .iter()
        .filter_map(|c| {
            let product = products.iter().find(|p| p.id == c.product_id)?;
            keep(c, product).then(|| LedgerEntry {
                consumption: c.clone(),
                product: product.clone(),
            })
        })
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        let by_email = users.iter().find(|u| u.email.as_str() == identifier);
        let found = by_email.or_else(|| {
            users
                .iter()
                .find(|u| u.war_name.to_lowercase() == identifier)
        });
        Ok(found.cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| &u.email == email).cloned())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = Utc::now();
        let created = User {
            id: UserId::new(),
            email: user.email,
            war_name: user.war_name,
            rank: user.rank,
            company: user.company,
            phone: user.phone,
            is_admin: user.is_admin,
            password_hash: user.password_hash,
            pix_key: user.pix_key,
            qr_code_url: None,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.war_name = update.war_name;
        user.rank = update.rank;
        user.company = update.company;
        user.phone = update.phone;
        user.pix_key = update.pix_key;
        user.qr_code_url = update.qr_code_url;
        if let Some(hash) = update.password_hash {
            user.password_hash = Some(hash);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_admin(&self, email: &Email, is_admin: bool) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| &u.email == email)
            .ok_or(RepositoryError::NotFound)?;
        user.is_admin = is_admin;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn first_admin(&self) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.is_admin).cloned())
    }

    async fn list_products(&self, include_unavailable: bool) -> StoreResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| include_unavailable || p.available)
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, owner: UserId, product: NewProduct) -> StoreResult<Product> {
        let created = Product {
            id: ProductId::new(),
            name: product.name,
            price: product.price,
            available: product.available,
            image_url: product.image_url,
            admin_id: Some(owner),
            created_at: Utc::now(),
        };
        self.products.write().await.push(created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        product: NewProduct,
    ) -> StoreResult<Product> {
        let mut products = self.products.write().await;
        let existing = products
            .iter_mut()
            .find(|p| p.id == id && p.editable_by(owner))
            .ok_or(RepositoryError::NotFound)?;
        existing.name = product.name;
        existing.price = product.price;
        existing.available = product.available;
        existing.image_url = product.image_url;
        existing.admin_id.get_or_insert(owner);
        Ok(existing.clone())
    }

    async fn delete_product(&self, id: ProductId, owner: UserId) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        let mut consumptions = self.consumptions.write().await;
        let before = products.len();
        products.retain(|p| !(p.id == id && p.editable_by(owner)));
        let deleted = products.len() < before;
        if deleted {
            consumptions.retain(|c| c.product_id != id);
        }
        Ok(deleted)
    }

    async fn assign_unowned_products(&self, admin: UserId) -> StoreResult<u64> {
        let mut products = self.products.write().await;
        let mut assigned = 0;
        for product in products.iter_mut().filter(|p| p.admin_id.is_none()) {
            product.admin_id = Some(admin);
            assigned += 1;
        }
        Ok(assigned)
    }

    async fn create_consumption(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> StoreResult<Consumption> {
        let users = self.users.read().await;
        let products = self.products.read().await;
        if !users.iter().any(|u| u.id == user) || !products.iter().any(|p| p.id == product) {
            return Err(RepositoryError::NotFound);
        }
        let created = Consumption {
            id: ConsumptionId::new(),
            user_id: user,
            product_id: product,
            quantity,
            created_at: Utc::now(),
        };
        self.consumptions.write().await.push(created.clone());
        Ok(created)
    }

    async fn list_consumptions_for_user(&self, user: UserId) -> StoreResult<Vec<LedgerEntry>> {
        let products = self.products.read().await;
        let consumptions = self.consumptions.read().await;
        Ok(join(&consumptions, &products, |c, _| c.user_id == user))
    }

    async fn list_consumptions_for_admin(&self, admin: UserId) -> StoreResult<Vec<LedgerEntry>> {
        let products = self.products.read().await;
        let consumptions = self.consumptions.read().await;
        Ok(join(&consumptions, &products, |_, p| p.admin_id == Some(admin)))
    }

    async fn delete_consumption(&self, id: ConsumptionId) -> StoreResult<u64> {
        let mut consumptions = self.consumptions.write().await;
        let before = consumptions.len();
        consumptions.retain(|c| c.id != id);
        Ok((before - consumptions.len()) as u64)
    }

    async fn delete_consumptions_for_user(&self, user: UserId) -> StoreResult<u64> {
        let mut consumptions = self.consumptions.write().await;
        let before = consumptions.len();
        consumptions.retain(|c| c.user_id != user);
        Ok((before - consumptions.len()) as u64)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

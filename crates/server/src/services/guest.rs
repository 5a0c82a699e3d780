//! Guest accounts.
//!
//! One canonical account per [`GuestKind`], found or created on demand so a
//! demo visitor can try the app without registering.

use rand::Rng;

use cantina_core::{Email, GuestKind, ProductId, Quantity};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User};
use crate::services::auth::{AuthError, hash_password};

const GUEST_PASSWORD: &str = "guest123";
const GUEST_RANK: &str = "Guest";
const GUEST_COMPANY: &str = "Test Company";
const GUEST_PHONE: &str = "11999999999";

/// Sample rows given to a fresh client guest, taken from the first products
/// in catalog order whether or not they are available.
const SEED_ROWS: usize = 3;

struct GuestProfile {
    email: &'static str,
    war_name: &'static str,
    pix_key: Option<&'static str>,
}

const fn profile(kind: GuestKind) -> GuestProfile {
    match kind {
        GuestKind::Client => GuestProfile {
            email: "guest@example.com",
            war_name: "Guest User",
            pix_key: Some("guest@pix"),
        },
        GuestKind::Admin => GuestProfile {
            email: "admin-guest@example.com",
            war_name: "Admin Guest",
            pix_key: None,
        },
    }
}

/// Find or create the guest account for `kind`.
///
/// Sample consumptions are seeded only when this call created the account.
///
/// # Errors
///
/// Returns `AuthError::Repository` if the store fails and
/// `AuthError::PasswordHash` if hashing the guest password fails.
pub async fn login_as_guest(store: &dyn Store, kind: GuestKind) -> Result<User, AuthError> {
    let profile = profile(kind);
    let email = Email::from_trusted(profile.email.to_owned());

    if let Some(existing) = store.find_user_by_email(&email).await? {
        return Ok(existing);
    }

    let created = store
        .create_user(NewUser {
            email: email.clone(),
            war_name: profile.war_name.to_owned(),
            rank: GUEST_RANK.to_owned(),
            company: GUEST_COMPANY.to_owned(),
            phone: GUEST_PHONE.to_owned(),
            is_admin: kind.role().is_admin(),
            password_hash: Some(hash_password(GUEST_PASSWORD)?),
            pix_key: profile.pix_key.map(str::to_owned),
        })
        .await;

    let user = match created {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => {
            tracing::debug!(guest = kind.as_str(), "Guest created concurrently, re-reading");
            return store
                .find_user_by_email(&email)
                .await?
                .ok_or(AuthError::Repository(RepositoryError::NotFound));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, guest = kind.as_str(), "Guest account created");

    if kind == GuestKind::Client {
        seed_consumptions(store, &user).await?;
    }

    Ok(user)
}

async fn seed_consumptions(store: &dyn Store, user: &User) -> Result<(), AuthError> {
    let products: Vec<ProductId> = store
        .list_products(true)
        .await?
        .into_iter()
        .take(SEED_ROWS)
        .map(|p| p.id)
        .collect();

    let quantities: Vec<i64> = {
        let mut rng = rand::rng();
        products.iter().map(|_| rng.random_range(1..=5)).collect()
    };

    for (product, qty) in products.into_iter().zip(quantities) {
        let Ok(quantity) = Quantity::new(qty) else {
            continue;
        };
        store.create_consumption(user.id, product, quantity).await?;
    }
    Ok(())
}

//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during login, registration, guest login and
/// profile updates.
///
/// The `Display` text is for logs; the client-facing message comes from
/// [`AuthError::public_message`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// Identifier or password missing or blank.
    #[error("missing credentials")]
    MissingCredentials,

    /// No user matches the identifier.
    #[error("user not found")]
    UserNotFound,

    /// The account has no usable password hash.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The password does not match the stored hash.
    #[error("incorrect password")]
    IncorrectPassword,

    /// A required registration or profile field is missing or blank.
    #[error("missing required fields")]
    MissingFields,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] cantina_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Email already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Guest type other than `client` or `admin`.
    #[error("invalid guest type: {0}")]
    InvalidGuestType(#[from] cantina_core::GuestKindError),

    /// The caller tried to change someone else's profile.
    #[error("profile belongs to another user")]
    NotProfileOwner,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message returned to the client. Literal strings are part of the API.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingCredentials => "Email/Nome de Guerra e senha são obrigatórios".to_owned(),
            Self::UserNotFound => "Usuário não encontrado".to_owned(),
            Self::InvalidCredentials => "Credenciais inválidas".to_owned(),
            Self::IncorrectPassword => "Senha incorreta".to_owned(),
            Self::MissingFields => "All fields are required".to_owned(),
            Self::InvalidEmail(_) => "Invalid email address".to_owned(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::EmailTaken => "Email already registered".to_owned(),
            Self::InvalidGuestType(_) => "Type must be 'client' or 'admin'".to_owned(),
            Self::NotProfileOwner => "Unauthorized".to_owned(),
            Self::Repository(_) | Self::PasswordHash => "Internal server error".to_owned(),
        }
    }

    /// Whether this is a server-side failure rather than a caller mistake.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::PasswordHash)
    }
}

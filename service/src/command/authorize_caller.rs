//! [`Command`] for authorizing a [`Caller`].

use std::str::FromStr as _;

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        access::{Claims, Role, Token},
        Caller,
    },
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Caller`] by its access [`Token`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeCaller {
    /// Access [`Token`] to authorize.
    pub token: Token,
}

impl<Db> Command<AuthorizeCaller> for Service<Db> {
    type Ok = Caller;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeCaller,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeCaller { token } = cmd;

        let claims = jsonwebtoken::decode::<Claims>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        let role = Role::from_str(&claims.role)
            .map_err(|_| E::UnknownRole(claims.role.clone()))
            .map_err(tracerr::wrap!())?;

        Ok(Caller {
            account_id: claims.account_id,
            role,
        })
    }
}

/// Error of [`AuthorizeCaller`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`Token`] claims an unknown [`Role`].
    #[display("Unknown `Role`: {_0}")]
    #[from(ignore)]
    UnknownRole(#[error(not(source))] String),
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::fixture,
        domain::{
            access::{Claims, ExpirationDateTime, Role, Token},
            account,
        },
        Command as _,
    };

    use super::{AuthorizeCaller, ExecutionError};

    fn token(claims: &Claims) -> Token {
        let token = jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(fixture::JWT_SECRET),
        )
        .unwrap();
        token.parse().unwrap()
    }

    fn expires_in(secs: i64) -> ExpirationDateTime {
        DateTime::from_unix_timestamp(DateTime::now().unix_timestamp() + secs)
            .unwrap()
            .coerce()
    }

    #[tokio::test]
    async fn authorizes_caller_with_valid_token() {
        let svc = fixture::service("2026-01-01");
        let account_id = account::Id::new();

        let caller = svc
            .execute(AuthorizeCaller {
                token: token(&Claims {
                    account_id,
                    role: Role::Manager.to_string(),
                    expires_at: expires_in(3600),
                }),
            })
            .await
            .unwrap();

        assert_eq!(caller.account_id, account_id);
        assert_eq!(caller.role, Role::Manager);
    }

    #[tokio::test]
    async fn rejects_unknown_role() {
        let svc = fixture::service("2026-01-01");

        let err = svc
            .execute(AuthorizeCaller {
                token: token(&Claims {
                    account_id: account::Id::new(),
                    role: "TENANT".into(),
                    expires_at: expires_in(3600),
                }),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UnknownRole(_)));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let svc = fixture::service("2026-01-01");

        let err = svc
            .execute(AuthorizeCaller {
                token: token(&Claims {
                    account_id: account::Id::new(),
                    role: Role::Owner.to_string(),
                    expires_at: expires_in(-3600),
                }),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }
}

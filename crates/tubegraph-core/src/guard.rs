//! Ownership guard for mutations.

use crate::types::{Error, Owned, Result, UserId};

/// Fail with `Unauthorized` unless `actor` owns `entity`
///
/// Callers load the entity first, so a missing entity surfaces as NotFound
/// before this check can run.
pub fn authorize_owner<R: Owned + ?Sized>(entity: &R, actor: &UserId, what: &str) -> Result<()> {
    if entity.owner() == *actor {
        Ok(())
    } else {
        tracing::debug!(%actor, owner = %entity.owner(), what, "ownership check failed");
        Err(Error::unauthorized(format!("only the owner can modify this {what}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorKind, Post, ID16};

    fn post(owner: UserId) -> Post {
        Post {
            id: ID16::random(),
            owner,
            content: "hello".into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_owner_passes() {
        let owner = ID16::random();
        assert!(authorize_owner(&post(owner), &owner, "post").is_ok());
    }

    #[test]
    fn test_non_owner_is_unauthorized() {
        let err = authorize_owner(&post(ID16::random()), &ID16::random(), "post").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}

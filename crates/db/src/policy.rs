//! Row-level authorization.
//!
//! Every repository read and write path asks [`authorize`] before touching a
//! row. The rules live only here:
//!
//! | Table           | Read          | Insert         | Update | Delete        |
//! |-----------------|---------------|----------------|--------|---------------|
//! | Identity        | self          | system         | self   | self          |
//! | Profile         | anyone        | system         | owner  | cascade only  |
//! | Tutorial        | anyone        | owner = caller | owner  | owner         |
//! | TutorialLike    | anyone        | caller = user  | never  | caller = user |
//! | TutorialComment | anyone        | caller = user  | never  | caller = user |
//! | Enrollment      | caller = user | caller = user  | never  | caller = user |
//!
//! Object storage has its own rule: reads are public, writes require the
//! caller to own the first segment of the object key.

use tutorhub_common::{AppError, AppResult, AuthContext, object_owner};

/// Tables guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Identity,
    Profile,
    Tutorial,
    TutorialLike,
    TutorialComment,
    Enrollment,
}

impl Table {
    const fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Profile => "profile",
            Self::Tutorial => "tutorial",
            Self::TutorialLike => "tutorial_like",
            Self::TutorialComment => "tutorial_comment",
            Self::Enrollment => "enrollment",
        }
    }
}

/// Row operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Insert,
    Update,
    Delete,
}

/// Object storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOperation {
    Read,
    Write,
    Delete,
}

/// What a rule requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Public,
    Owner,
    Denied,
}

const fn rule(table: Table, op: Operation) -> Rule {
    use Operation::{Delete, Insert, Read, Update};

    match (table, op) {
        (Table::Identity, Read | Update | Delete) => Rule::Owner,
        (Table::Identity, Insert) => Rule::Denied,

        (Table::Profile, Read) => Rule::Public,
        (Table::Profile, Update) => Rule::Owner,
        (Table::Profile, Insert | Delete) => Rule::Denied,

        (Table::Tutorial, Read) => Rule::Public,
        (Table::Tutorial, Insert | Update | Delete) => Rule::Owner,

        (Table::TutorialLike | Table::TutorialComment, Read) => Rule::Public,
        (Table::TutorialLike | Table::TutorialComment, Insert | Delete) => Rule::Owner,
        (Table::TutorialLike | Table::TutorialComment, Update) => Rule::Denied,

        (Table::Enrollment, Read | Insert | Delete) => Rule::Owner,
        (Table::Enrollment, Update) => Rule::Denied,
    }
}

/// Decide whether `caller` may perform `op` on a `table` row owned by `owner`.
///
/// Returns `Unauthorized` when a caller is required but absent and
/// `Forbidden` when the caller is not allowed.
pub fn authorize(
    caller: Option<&AuthContext>,
    table: Table,
    op: Operation,
    owner: &str,
) -> AppResult<()> {
    match rule(table, op) {
        Rule::Public => Ok(()),
        Rule::Denied => Err(AppError::Forbidden(format!(
            "{op:?} on {} is not permitted",
            table.name()
        ))),
        Rule::Owner => {
            let caller = caller.ok_or(AppError::Unauthorized)?;
            if caller.is(owner) {
                Ok(())
            } else {
                Err(AppError::Forbidden(format!(
                    "{op:?} on {} row owned by another user",
                    table.name()
                )))
            }
        }
    }
}

/// Decide whether `caller` may perform `op` on the storage object `key`.
pub fn authorize_object(
    caller: Option<&AuthContext>,
    op: ObjectOperation,
    key: &str,
) -> AppResult<()> {
    let owner = object_owner(key)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid object key: {key}")))?;

    match op {
        ObjectOperation::Read => Ok(()),
        ObjectOperation::Write | ObjectOperation::Delete => {
            let caller = caller.ok_or(AppError::Unauthorized)?;
            if caller.is(owner) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Objects can only be written in your own folder".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AuthContext {
        AuthContext::new("alice", "t1")
    }

    fn bob() -> AuthContext {
        AuthContext::new("bob", "t2")
    }

    #[test]
    fn test_public_reads() {
        for table in [
            Table::Profile,
            Table::Tutorial,
            Table::TutorialLike,
            Table::TutorialComment,
        ] {
            assert!(authorize(None, table, Operation::Read, "alice").is_ok());
            assert!(authorize(Some(&bob()), table, Operation::Read, "alice").is_ok());
        }
    }

    #[test]
    fn test_enrollment_read_is_private() {
        assert!(authorize(Some(&alice()), Table::Enrollment, Operation::Read, "alice").is_ok());
        assert!(matches!(
            authorize(Some(&bob()), Table::Enrollment, Operation::Read, "alice"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize(None, Table::Enrollment, Operation::Read, "alice"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_tutorial_writes_require_owner() {
        for op in [Operation::Insert, Operation::Update, Operation::Delete] {
            assert!(authorize(Some(&alice()), Table::Tutorial, op, "alice").is_ok());
            assert!(matches!(
                authorize(Some(&bob()), Table::Tutorial, op, "alice"),
                Err(AppError::Forbidden(_))
            ));
            assert!(matches!(
                authorize(None, Table::Tutorial, op, "alice"),
                Err(AppError::Unauthorized)
            ));
        }
    }

    #[test]
    fn test_profile_is_system_created() {
        assert!(authorize(Some(&alice()), Table::Profile, Operation::Insert, "alice").is_err());
        assert!(authorize(Some(&alice()), Table::Profile, Operation::Delete, "alice").is_err());
        assert!(authorize(Some(&alice()), Table::Profile, Operation::Update, "alice").is_ok());
        assert!(authorize(Some(&bob()), Table::Profile, Operation::Update, "alice").is_err());
    }

    #[test]
    fn test_child_rows_are_never_updated() {
        for table in [Table::TutorialLike, Table::TutorialComment, Table::Enrollment] {
            assert!(matches!(
                authorize(Some(&alice()), table, Operation::Update, "alice"),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn test_child_rows_owned_by_user_field() {
        for table in [Table::TutorialLike, Table::TutorialComment, Table::Enrollment] {
            assert!(authorize(Some(&bob()), table, Operation::Insert, "bob").is_ok());
            assert!(authorize(Some(&bob()), table, Operation::Insert, "alice").is_err());
            assert!(authorize(Some(&bob()), table, Operation::Delete, "bob").is_ok());
            assert!(authorize(Some(&bob()), table, Operation::Delete, "alice").is_err());
        }
    }

    #[test]
    fn test_object_policy() {
        assert!(authorize_object(None, ObjectOperation::Read, "alice/a.png").is_ok());
        assert!(
            authorize_object(Some(&alice()), ObjectOperation::Write, "alice/a.png").is_ok()
        );
        assert!(matches!(
            authorize_object(Some(&bob()), ObjectOperation::Write, "alice/a.png"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_object(None, ObjectOperation::Delete, "alice/a.png"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authorize_object(Some(&alice()), ObjectOperation::Write, "a.png"),
            Err(AppError::BadRequest(_))
        ));
    }
}

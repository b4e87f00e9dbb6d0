use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::domain::account::{NewUser, Session, User};
use crate::domain::errors::DomainError;
use crate::domain::ports::AccountRepository;
use crate::schema::{sessions, users};

use super::models::{NewUserRow, SessionRow, UserRow};
use super::DieselStore;

impl AccountRepository for DieselStore {
    fn username_taken(&self, username: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let taken = diesel::select(exists(
            users::table.filter(users::username.eq(username)),
        ))
        .get_result(&mut conn)?;
        Ok(taken)
    }

    fn email_taken(&self, email: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let taken = diesel::select(exists(users::table.filter(users::email.eq(email))))
            .get_result(&mut conn)?;
        Ok(taken)
    }

    fn create_user(&self, user: NewUser) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;

        let result = diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: Uuid::new_v4(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn);

        match result {
            Ok(row) => Ok(User::from(row)),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                Err(DomainError::Conflict(info.message().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(|row| {
            let hash = row.password_hash.clone();
            (User::from(row), hash)
        }))
    }

    fn create_session(&self, session: &Session) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(sessions::table)
            .values(&SessionRow {
                token: session.token.clone(),
                user_id: session.user_id,
                created_at: Utc::now(),
                expires_at: session.expires_at,
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn find_session(&self, token: &str) -> Result<Option<(Session, User)>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = sessions::table
            .inner_join(users::table)
            .filter(sessions::token.eq(token))
            .select((SessionRow::as_select(), UserRow::as_select()))
            .first::<(SessionRow, UserRow)>(&mut conn)
            .optional()?;

        Ok(row.map(|(session, user)| (Session::from(session), User::from(user))))
    }

    fn delete_session(&self, token: &str) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(&mut conn)?;
        Ok(())
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(sessions::table.filter(sessions::expires_at.le(now)))
            .execute(&mut conn)?;
        Ok(deleted)
    }
}

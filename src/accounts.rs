use parking_lot::RwLock;
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand_core::OsRng;

use crate::err::Error;
use crate::models::{AccountId, Identity, RegisterAccount, Role};

#[derive(Debug, Clone)]
struct StoredAccount {
    identity: Identity,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Registry {
    accounts: Vec<StoredAccount>,
    last_id: AccountId,
}

#[derive(Debug, Default)]
pub struct AccountStore {
    registry: RwLock<Registry>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the demo student and recruiter.
    pub fn with_demo_accounts() -> Result<Self, Error> {
        let store = Self::new();
        store.append_account(RegisterAccount {
            name: "John Doe".to_string(),
            email: "student@demo.com".to_string(),
            password: "student123".to_string(),
            role: Role::Student,
            institution: Some("Jharkhand University".to_string()),
            registration_number: Some("JU2021001".to_string()),
            company: None,
        })?;
        store.append_account(RegisterAccount {
            name: "Sarah Smith".to_string(),
            email: "recruiter@demo.com".to_string(),
            password: "recruiter123".to_string(),
            role: Role::Recruiter,
            institution: None,
            registration_number: None,
            company: Some("TechCorp Solutions".to_string()),
        })?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.registry.read().accounts.len()
    }

    /// Exact match on email, role and password. With duplicate registrations the
    /// earliest matching account wins.
    pub fn find_account(&self, email: &str, password: &str, role: Role) -> Option<Identity> {
        let candidates: Vec<StoredAccount> = self
            .registry
            .read()
            .accounts
            .iter()
            .filter(|acc| acc.identity.email == email && acc.identity.role == role)
            .cloned()
            .collect();

        candidates.into_iter().find_map(|acc| {
            let hash = match PasswordHash::new(&acc.password_hash) {
                Ok(hash) => hash,
                Err(err) => {
                    log::error!("corrupt password hash for account {}: {}", acc.identity.id, err);
                    return None;
                }
            };
            Pbkdf2
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
                .then(|| acc.identity)
        })
    }

    /// Registers unconditionally; duplicate emails are accepted.
    pub fn append_account(&self, data: RegisterAccount) -> Result<Identity, Error> {
        let password_hash = Pbkdf2
            .hash_password(data.password.as_bytes(), &SaltString::generate(&mut OsRng))?
            .to_string();

        let mut registry = self.registry.write();
        registry.last_id += 1;
        let identity = Identity {
            id: registry.last_id,
            name: data.name,
            email: data.email,
            role: data.role,
            institution: data.institution,
            registration_number: data.registration_number,
            company: data.company,
        };
        registry.accounts.push(StoredAccount {
            identity: identity.clone(),
            password_hash,
        });
        log::info!(
            "registered account {} ({:?}, {})",
            identity.id,
            identity.role,
            identity.email
        );
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str, password: &str, role: Role) -> RegisterAccount {
        RegisterAccount {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            institution: None,
            registration_number: None,
            company: None,
        }
    }

    #[test]
    fn demo_accounts_are_seeded() {
        let store = AccountStore::with_demo_accounts().unwrap();
        assert_eq!(store.len(), 2);

        let student = store
            .find_account("student@demo.com", "student123", Role::Student)
            .unwrap();
        assert_eq!(student.id, 1);
        assert_eq!(student.name, "John Doe");
        assert_eq!(student.registration_number.as_deref(), Some("JU2021001"));

        let recruiter = store
            .find_account("recruiter@demo.com", "recruiter123", Role::Recruiter)
            .unwrap();
        assert_eq!(recruiter.id, 2);
        assert_eq!(recruiter.company.as_deref(), Some("TechCorp Solutions"));
    }

    #[test]
    fn lookup_requires_all_three_fields() {
        let store = AccountStore::with_demo_accounts().unwrap();
        assert!(store
            .find_account("student@demo.com", "wrong", Role::Student)
            .is_none());
        assert!(store
            .find_account("student@demo.com", "student123", Role::Recruiter)
            .is_none());
        assert!(store
            .find_account("STUDENT@demo.com", "student123", Role::Student)
            .is_none());
    }

    #[test]
    fn ids_are_monotonic() {
        let store = AccountStore::with_demo_accounts().unwrap();
        let a = store
            .append_account(registration("a@x.io", "pw", Role::Student))
            .unwrap();
        let b = store
            .append_account(registration("b@x.io", "pw", Role::Recruiter))
            .unwrap();
        assert_eq!(a.id, 3);
        assert_eq!(b.id, 4);
    }

    #[test]
    fn duplicate_email_earliest_match_wins() {
        let store = AccountStore::new();
        let first = store
            .append_account(registration("dup@x.io", "same", Role::Student))
            .unwrap();
        let second = store
            .append_account(registration("dup@x.io", "other", Role::Student))
            .unwrap();

        assert_eq!(store.find_account("dup@x.io", "same", Role::Student), Some(first));
        assert_eq!(store.find_account("dup@x.io", "other", Role::Student), Some(second));
    }
}

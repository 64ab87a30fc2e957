use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn for_user(user_id: uuid::Uuid) -> Self {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS)).timestamp();
        Self {
            sub: user_id.to_string(),
            exp,
        }
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let header = Header::default();
    let key = EncodingKey::from_secret(key.as_ref());

    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(token)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    let claims = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)?;
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let id = uuid::Uuid::new_v4();
        let token = generate_token(UserClaims::for_user(id), "secret").unwrap();
        let data = process_token(&token, "secret").unwrap();
        assert_eq!(data.claims.sub, id.to_string());
    }

    #[test]
    fn token_wrong_key() {
        let token = generate_token(UserClaims::for_user(uuid::Uuid::new_v4()), "secret").unwrap();
        assert!(process_token(&token, "other").is_err());
    }

    #[test]
    fn token_expired() {
        let claims = UserClaims {
            sub: uuid::Uuid::new_v4().to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp(),
        };
        let token = generate_token(claims, "secret").unwrap();
        assert!(process_token(&token, "secret").is_err());
    }
}

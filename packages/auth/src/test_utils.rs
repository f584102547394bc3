// ABOUTME: Fixed RSA test key and token signing helpers
// ABOUTME: Lets tests mint access tokens that a verifier built from test_jwks() accepts

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::jwt::{Claims, Jwk, JwkSet, KeySet, JwtVerifier};

pub const TEST_KID: &str = "test-key";
pub const TEST_ISSUER: &str = "identra";

const TEST_PRIVATE_KEY_PEM: &[u8] = include_bytes!("../testdata/rsa_private.pem");

// Public half of testdata/rsa_private.pem
const TEST_KEY_N: &str = "z_kWx3GolHypx8s_b_mLRJLsd_2jil97xxCfEUXoskXaigqG74C6x0nA8Zn4tewfjpqnkdbFIHKsAUt2xp3vlN6qscN_B25VIC-DdMxULn0yFHvRv-vbELBo5k-iugcyX1touqVBKhHKNj4KIMfLv9FYFXtGNmZr4PzVjGiAiZaTi2fgoeTP0EmqE6LEm8CTM_ahmCphgPf1XerC90ntA3Lz2L4JkO2BK7w3RdWAaG6Ukzgo-cgKzAquFKboBYyN4QmUn1pVd76S75FrUGCeR96X2K1W3oqupfux0OgqPXk5qvpQg9qtRPvdpYCRmHZoqETNtSUo3BpeCx3Lf7vm9w";
const TEST_KEY_E: &str = "AQAB";

/// JWKS document containing the test key
pub fn test_jwks() -> JwkSet {
    JwkSet {
        keys: vec![Jwk {
            kid: Some(TEST_KID.to_string()),
            kty: "RSA".to_string(),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
            n: Some(TEST_KEY_N.to_string()),
            e: Some(TEST_KEY_E.to_string()),
        }],
    }
}

/// Verifier trusting only the test key, expecting TEST_ISSUER
pub fn test_verifier() -> JwtVerifier {
    let keys = KeySet::from_jwks(&test_jwks()).expect("test JWKS is valid");
    JwtVerifier::new(keys, TEST_ISSUER)
}

/// Claims for a valid access token that expires in an hour
pub fn access_claims(user_id: &str) -> Claims {
    let now = Utc::now();
    Claims {
        typ: Some("access".to_string()),
        iss: Some(TEST_ISSUER.to_string()),
        exp: Some((now + Duration::hours(1)).timestamp()),
        sub: Some(user_id.to_string()),
        uid: None,
        iat: Some(now.timestamp()),
    }
}

/// Sign with the test key under TEST_KID
pub fn sign_token(claims: &Claims) -> String {
    sign_token_with_kid(claims, Some(TEST_KID))
}

pub fn sign_token_with_kid(claims: &Claims, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY_PEM).expect("test key is valid PEM");
    encode(&header, claims, &key).expect("signing with test key")
}

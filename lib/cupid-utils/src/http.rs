use std::collections::HashMap;

use crate::utils::CaseInsensitiveString;

pub type Header = (CaseInsensitiveString, String);

pub enum CookieParsingError {
    IncorrectHeader,
}

pub fn get_cookies_hashmap(
    headers: &HashMap<CaseInsensitiveString, String>,
) -> Result<HashMap<String, String>, CookieParsingError> {
    let mut res = HashMap::new();
    if let Some(cookie_list) = headers.get(&"Cookie".into()) {
        for cookie in cookie_list.split("; ") {
            let (key, value) = match cookie.split_once('=') {
                Some(key_value) => key_value,
                None => return Err(CookieParsingError::IncorrectHeader),
            };
            res.insert(key.into(), value.into());
        }
    }
    Ok(res)
}

pub fn header_set_cookie(key: &str, value: &str) -> Header {
    ("Set-Cookie".into(), format!("{key}={value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookie_header() {
        let headers = HashMap::from([("Cookie".into(), "_cupid_sid=abc; theme=dark".to_owned())]);
        let cookies = get_cookies_hashmap(&headers).unwrap_or_else(|_| panic!("parsing failed"));
        assert_eq!(cookies.get("_cupid_sid"), Some(&"abc".to_owned()));
        assert_eq!(cookies.get("theme"), Some(&"dark".to_owned()));
    }

    #[test]
    fn no_cookie_header_means_no_cookies() {
        let headers = HashMap::from([("Host".into(), "localhost".to_owned())]);
        let cookies = get_cookies_hashmap(&headers).unwrap_or_else(|_| panic!("parsing failed"));
        assert!(cookies.is_empty());
    }

    #[test]
    fn rejects_malformed_cookie() {
        let headers = HashMap::from([("Cookie".into(), "no_equals_sign".to_owned())]);
        assert!(get_cookies_hashmap(&headers).is_err());
    }
}

//! Allow-lists for values that end up on a command line

const MAX_ADDRESS_LEN: usize = 253;
const MAX_USERNAME_LEN: usize = 32;

/// Hostnames, IPv4 and IPv6 literals
pub fn validate_address(address: &str) -> Result<(), String> {
    if address.is_empty() {
        return Err("address is empty".to_string());
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(format!("address is longer than {MAX_ADDRESS_LEN} characters"));
    }
    if address.starts_with('-') {
        return Err("address must not start with '-'".to_string());
    }
    if let Some(c) = address
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':')))
    {
        return Err(format!("address contains invalid character {c:?}"));
    }
    Ok(())
}

/// POSIX-portable user names
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("username is empty".to_string());
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(format!("username is longer than {MAX_USERNAME_LEN} characters"));
    }
    if username.starts_with('-') {
        return Err("username must not start with '-'".to_string());
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("username contains invalid character {c:?}"));
    }
    Ok(())
}

pub fn validate_port(port: u16) -> Result<(), String> {
    if port == 0 {
        return Err("port must not be 0".to_string());
    }
    Ok(())
}

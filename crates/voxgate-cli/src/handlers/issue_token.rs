//! `voxgate issue-token`

use std::time::Duration;

use voxgate_auth::JwtVerifier;

use crate::error::CliError;
use crate::parser::GateArgs;

/// Sign a token for `subject` with the configured secret.
pub fn issue(args: &GateArgs, subject: &str, ttl_secs: u64) -> Result<String, CliError> {
    let algorithm = JwtVerifier::parse_algorithm(&args.jwt.jwt_algorithm)?;
    let mut issuer = JwtVerifier::with_algorithm(args.jwt_secret()?.as_bytes(), algorithm)?;
    if let Some(iss) = &args.jwt.jwt_issuer {
        issuer = issuer.with_issuer(iss.clone());
    }
    Ok(issuer.issue(subject, Duration::from_secs(ttl_secs))?)
}

pub fn execute(args: &GateArgs, subject: &str, ttl_secs: u64) -> Result<(), CliError> {
    println!("{}", issue(args, subject, ttl_secs)?);
    Ok(())
}

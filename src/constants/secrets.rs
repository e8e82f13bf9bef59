//! Reading of docker secrets mounted into the container.
use std::{fs, io, path::Path};

const DOCKER_SECRETS_PATH: &str = "/run/secrets/";

/// Read the named secret, without the trailing newline most secret files end with.
pub fn read_secret(name: &str) -> Result<String, io::Error> {
    let secret_val = fs::read_to_string(Path::new(DOCKER_SECRETS_PATH).join(name.to_lowercase()))?;
    Ok(secret_val.trim_end().to_owned())
}

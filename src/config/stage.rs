use anyhow::anyhow;

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    #[default]
    Sandbox,
    Production,
}

impl TryFrom<&str> for Stage {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "sandbox" => Ok(Stage::Sandbox),
            "production" | "live" => Ok(Stage::Production),
            other => Err(anyhow!("Unknown stage: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_stages() {
        assert_eq!(Stage::try_from("sandbox").unwrap(), Stage::Sandbox);
        assert_eq!(Stage::try_from("production").unwrap(), Stage::Production);
        assert_eq!(Stage::try_from("live").unwrap(), Stage::Production);
        assert_eq!(Stage::try_from("PRODUCTION").unwrap(), Stage::Production);
    }

    #[test]
    fn unknown_stage_falls_back_to_sandbox_default() {
        assert_eq!(Stage::try_from("staging").unwrap_or_default(), Stage::Sandbox);
        assert_eq!(Stage::try_from("").unwrap_or_default(), Stage::Sandbox);
    }
}

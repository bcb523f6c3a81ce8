use std::str::FromStr;

/// Which analysis passes report diagnostics. Every pass is on by default.
///
/// Passes only gate their own diagnostics; scopes and types are always
/// built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub type_checking: bool,
    pub scope_analysis: bool,
    pub control_flow: bool,
    pub unused_variables: bool,
    pub shadowing: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig::all()
    }
}

impl AnalyzerConfig {
    pub const fn all() -> AnalyzerConfig {
        AnalyzerConfig {
            type_checking: true,
            scope_analysis: true,
            control_flow: true,
            unused_variables: true,
            shadowing: true,
        }
    }

    pub const fn none() -> AnalyzerConfig {
        AnalyzerConfig {
            type_checking: false,
            scope_analysis: false,
            control_flow: false,
            unused_variables: false,
            shadowing: false,
        }
    }

    #[must_use]
    pub fn with_type_checking(mut self, enabled: bool) -> Self {
        self.type_checking = enabled;
        self
    }

    #[must_use]
    pub fn with_scope_analysis(mut self, enabled: bool) -> Self {
        self.scope_analysis = enabled;
        self
    }

    #[must_use]
    pub fn with_control_flow(mut self, enabled: bool) -> Self {
        self.control_flow = enabled;
        self
    }

    #[must_use]
    pub fn with_unused_variables(mut self, enabled: bool) -> Self {
        self.unused_variables = enabled;
        self
    }

    #[must_use]
    pub fn with_shadowing(mut self, enabled: bool) -> Self {
        self.shadowing = enabled;
        self
    }

    /// Whether diagnostics of `pass` are reported.
    pub fn enabled(&self, pass: Pass) -> bool {
        match pass {
            Pass::TypeChecking => self.type_checking,
            Pass::ScopeAnalysis => self.scope_analysis,
            Pass::ControlFlow => self.control_flow,
            Pass::UnusedVariables => self.unused_variables,
            Pass::Shadowing => self.shadowing,
        }
    }

    fn set(&mut self, pass: &str, enabled: bool) -> Result<(), ConfigError> {
        let flag = match pass {
            "types" | "type-checking" => &mut self.type_checking,
            "scopes" | "scope-analysis" => &mut self.scope_analysis,
            "control-flow" => &mut self.control_flow,
            "unused" | "unused-variables" => &mut self.unused_variables,
            "shadowing" => &mut self.shadowing,
            "all" => {
                *self = if enabled {
                    AnalyzerConfig::all()
                } else {
                    AnalyzerConfig::none()
                };
                return Ok(());
            }
            _ => return Err(ConfigError::UnknownPass(pass.into())),
        };
        *flag = enabled;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    TypeChecking,
    ScopeAnalysis,
    ControlFlow,
    UnusedVariables,
    Shadowing,
}

/// Parses a comma separated list of changes to the default configuration.
/// `name` enables a pass and `no-name` disables it, so `none,unused` runs
/// only the unused variables pass.
impl FromStr for AnalyzerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = AnalyzerConfig::default();
        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            match item {
                "none" => config = AnalyzerConfig::none(),
                _ => match item.strip_prefix("no-") {
                    Some(pass) => config.set(pass, false)?,
                    None => config.set(item, true)?,
                },
            }
        }
        Ok(config)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown analysis pass `{0}`")]
    UnknownPass(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pass_list() {
        let config: AnalyzerConfig = "unused,no-shadowing".parse().unwrap();
        assert_eq!(config, AnalyzerConfig::all().with_shadowing(false));

        let config: AnalyzerConfig = "none, types , control-flow".parse().unwrap();
        assert_eq!(
            config,
            AnalyzerConfig::none()
                .with_type_checking(true)
                .with_control_flow(true)
        );

        assert_eq!("".parse(), Ok(AnalyzerConfig::all()));
        assert_eq!("all".parse(), Ok(AnalyzerConfig::all()));
        assert_eq!("no-all".parse(), Ok(AnalyzerConfig::none()));
    }

    #[test]
    fn test_enabled() {
        let config = AnalyzerConfig::none().with_shadowing(true);
        assert!(config.enabled(Pass::Shadowing));
        assert!(!config.enabled(Pass::TypeChecking));
    }

    #[test]
    fn test_unknown_pass() {
        let error = "unused,bogus".parse::<AnalyzerConfig>().unwrap_err();
        assert_eq!(error, ConfigError::UnknownPass("bogus".into()));
        assert_eq!(error.to_string(), "unknown analysis pass `bogus`");
    }
}

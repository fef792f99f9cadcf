use std::fmt::{Display, Formatter};

/// A local TCP port a chromedriver listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port(pub u16);

impl From<u16> for Port {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl Display for Port {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PortRequest {
    /// Let chromedriver pick a free port.
    #[default]
    Any,
    Specific(Port),
}

impl From<Option<u16>> for PortRequest {
    fn from(port: Option<u16>) -> Self {
        port.map_or(PortRequest::Any, |port| PortRequest::Specific(Port(port)))
    }
}

/// Extracts the port from chromedriver's start-up line, e.g.
/// `ChromeDriver was started successfully on port 41729.`
pub(crate) fn parse_started_port(line: &str) -> Option<Port> {
    if !line.contains("started successfully on port") {
        return None;
    }
    line.trim()
        .trim_matches('"')
        .trim_end_matches('.')
        .rsplit(' ')
        .next()
        .and_then(|port| port.parse::<u16>().ok())
        .map(Port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn parses_the_announced_port() {
        assert_that(parse_started_port(
            "ChromeDriver was started successfully on port 41729.",
        ))
        .is_equal_to(Some(Port(41729)));
    }

    #[test]
    fn ignores_other_lines() {
        assert_that(parse_started_port("Starting ChromeDriver 131.0.6778.85")).is_none();
        assert_that(parse_started_port("started successfully on port ???")).is_none();
    }
}

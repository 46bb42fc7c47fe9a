use clap::Parser;

/// Demo command line.
#[derive(clap::Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "lumen-demo", about = "Frame-pipeline rendering demo", long_about = None)]
pub struct Args {
    /// Run this many frames without a window.
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u64>,

    /// Number of frame resource slots in the ring.
    #[arg(
        long,
        default_value_t = 3,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub frames_in_flight: usize,
}

impl Default for Args {
    fn default() -> Self {
        Self::parse_from(["lumen-demo"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_windowed_triple_buffering() {
        let args = Args::try_parse_from(["lumen-demo"]).unwrap();
        assert_eq!(args, Args::default());
        assert_eq!(args.headless, None);
        assert_eq!(args.frames_in_flight, 3);
    }

    #[test]
    fn parses_both_flags() {
        let args =
            Args::try_parse_from(["lumen-demo", "--headless", "120", "--frames-in-flight", "2"])
                .unwrap();
        assert_eq!(args.headless, Some(120));
        assert_eq!(args.frames_in_flight, 2);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Args::try_parse_from(["lumen-demo", "--headless"]).is_err());
        assert!(Args::try_parse_from(["lumen-demo", "--headless", "many"]).is_err());
        assert!(Args::try_parse_from(["lumen-demo", "--frames-in-flight", "0"]).is_err());
        assert!(Args::try_parse_from(["lumen-demo", "--fullscreen"]).is_err());
    }
}

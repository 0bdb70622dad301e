use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Live hand gesture recognition", long_about = None)]
pub struct Args {
    /// Camera Index (default 0)
    #[arg(short, long, default_value_t = 0)]
    pub cam_index: u32,

    /// Configuration file
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Gesture classifier (.onnx), overrides the config
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Mirror the camera output
    #[arg(long, default_value_t = false)]
    pub mirror: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,

    /// Ask the sign language knowledge base a question and exit
    #[arg(long, value_name = "QUESTION")]
    pub ask: Option<String>,

    /// Take the speed sign quiz in the terminal and exit
    #[arg(long)]
    pub sign_quiz: bool,

    /// Stop after this many processed frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Run without a window, printing predictions instead
    #[arg(long)]
    pub headless: bool,

    /// Where confirmed gestures are written as CSV
    #[arg(long, default_value = "gesture_log.csv")]
    pub export: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["signsight"]);
        assert_eq!(args.cam_index, 0);
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert!(args.ask.is_none() && !args.headless);
    }

    #[test]
    fn ask_takes_a_question() {
        let args = Args::parse_from(["signsight", "--ask", "what is deaf culture?", "-c", "2"]);
        assert_eq!(args.ask.as_deref(), Some("what is deaf culture?"));
        assert_eq!(args.cam_index, 2);
    }

    #[test]
    fn sign_quiz_is_a_switch() {
        assert!(!Args::parse_from(["signsight"]).sign_quiz);
        assert!(Args::parse_from(["signsight", "--sign-quiz"]).sign_quiz);
    }
}

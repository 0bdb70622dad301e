use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use image::Rgb;
use minifb::Key;
use rand::Rng;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signsight::annotate::FrameAnnotator;
use signsight::camera::{self, CameraSource};
use signsight::config::{parse_hex, AppConfig};
use signsight::font;
use signsight::inference::{OnnxGestureModel, OnnxHandDetector};
use signsight::knowledge::KnowledgeMatcher;
use signsight::landmarks::LandmarkExtractor;
use signsight::pipeline::{FrameResult, GesturePipeline, RecognitionLoop, StopSignal};
use signsight::predictor::GesturePredictor;
use signsight::quiz::QuizOutcome;
use signsight::session::RecognitionSession;
use signsight::types::Frame;

mod args;
mod output;

use args::Args;
use output::WindowOutput;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("signsight=info")))
        .init();

    let args = Args::parse();

    if args.list {
        return camera::list_cameras();
    }

    if let Some(question) = &args.ask {
        println!("{}", KnowledgeMatcher::default().answer(question));
        return Ok(());
    }

    let mut config = AppConfig::load_from(&args.config)?;

    if args.sign_quiz {
        let mut session = RecognitionSession::new(config.recognition.clone());
        run_sign_quiz(&mut session, io::stdin().lock(), &mut rand::thread_rng())?;
        return Ok(());
    }

    if let Some(model) = &args.model {
        config.model.classifier_path = model.clone();
    }

    // Both models are required; a failure here ends the program before the camera opens.
    let threads = config.model.intra_threads;
    let classifier = OnnxGestureModel::new(&config.model.classifier_path, threads)
        .context("Failed to load gesture classifier")?;
    let predictor = GesturePredictor::new(Arc::new(classifier))?;
    let detector = OnnxHandDetector::new(&config.model.landmark_path, threads)
        .context("Failed to load hand landmark model")?;
    let extractor = LandmarkExtractor::new(detector, config.detection.clone());

    let mut camera = CameraSource::new(args.cam_index, args.mirror || config.ui.mirror_mode)?;
    let pipeline = GesturePipeline::new(extractor, predictor);
    let mut recognition = RecognitionLoop::new(pipeline, config.recognition.max_consecutive_failures)
        .with_frame_limit(args.frames);

    let mut session = RecognitionSession::new(config.recognition.clone());
    let stop = StopSignal::new();

    let stats = if args.headless {
        let mut last = None;
        recognition.run(&mut camera, &stop, |result| {
            session.observe(result.prediction);
            let label = result.prediction.and_then(|p| p.label);
            if label != last {
                match result.prediction {
                    Some(p) => println!("{}", p.to_string().green()),
                    None => println!("{}", "no hand".dimmed()),
                }
                last = label;
            }
        })?
    } else {
        let mut window = WindowOutput::new("SignSight", camera.width() as usize, camera.height() as usize)?;
        let annotator = FrameAnnotator::new(&config.ui);
        let text_color = Rgb(parse_hex(&config.ui.text_color_hex));
        let scale = config.ui.text_scale.max(1);

        println!("Controls: [C] Confirm  [X] Incorrect  [E] Export CSV  [Q] Gesture quiz  [S] Skip  [Esc] Quit");

        recognition.run(&mut camera, &stop, |result| {
            if !window.is_open() {
                stop.stop();
                return;
            }
            if session.observe(result.prediction) {
                report_quiz(&mut session);
            }

            for key in window.keys_pressed() {
                handle_key(key, &mut session, &args.export, &stop);
            }

            let mut shown = draw_result(&annotator, &result);
            draw_hud(&mut shown, &session, text_color, scale);
            if let Err(e) = window.show(&shown) {
                warn!(error = %e, "window update failed");
                stop.stop();
            }
        })?
    };

    info!(processed = stats.processed, skipped = stats.skipped, "session finished");

    if !session.confirmed().is_empty() {
        export(&session, &args.export)?;
    }
    Ok(())
}

fn draw_result(annotator: &FrameAnnotator, result: &FrameResult) -> Frame {
    annotator.annotate(&result.frame, result.landmarks.as_ref(), result.prediction.as_ref())
}

fn draw_hud(frame: &mut Frame, session: &RecognitionSession, color: Rgb<u8>, scale: u32) {
    let line = font::text_height(scale) + 2 * scale;
    let mut y = 10 + line;

    if let Some(report) = session.analysis() {
        for text in [
            format!("Stability: {}", report.stability),
            format!("Speed: {}", report.pacing),
        ] {
            font::draw_text_line(&mut frame.image, 10, y, &text, color, scale);
            y += line;
        }
    }

    if let Some(quiz) = session.gesture_quiz() {
        let text = match quiz.current_target() {
            Some(target) => {
                let (at, total) = quiz.progress();
                format!("Sign: {} {}/{}", target, at, total)
            }
            None => "Quiz done".to_string(),
        };
        font::draw_text_line(&mut frame.image, 10, y, &text, color, scale);
    }

    let text = format!("Confirmed: {}", session.confirmed().len());
    let x = frame.width().saturating_sub(font::measure_text_width(&text, scale) + 10);
    font::draw_text_line(&mut frame.image, x, 10, &text, color, scale);
}

fn handle_key(key: Key, session: &mut RecognitionSession, export_path: &Path, stop: &StopSignal) {
    match key {
        Key::Escape => stop.stop(),
        Key::C => match session.confirm_current() {
            Some(obs) => println!(
                "{} {} ({})",
                obs.display_time(),
                obs.gesture.to_string().green(),
                obs.display_confidence()
            ),
            None => println!("{}", "Nothing to confirm".yellow()),
        },
        Key::X => {
            if let Some(entry) = session.mark_incorrect() {
                println!("{}", format!("Marked '{}' as incorrect", entry.predicted).red());
            }
        }
        Key::E => {
            if let Err(e) = export(session, export_path) {
                warn!(error = %e, "export failed");
            }
        }
        Key::Delete => {
            session.confirmed_mut().clear();
            println!("{}", "Confirmed gestures cleared".yellow());
        }
        Key::Q => {
            session.start_gesture_quiz(&mut rand::thread_rng(), Instant::now());
            println!("{}", "Speed gesture quiz started".cyan());
        }
        Key::S => {
            session.skip_gesture();
            report_quiz(session);
        }
        _ => {}
    }
}

/// Scores the gesture quiz as soon as its last target is matched or skipped.
fn report_quiz(session: &mut RecognitionSession) {
    if !session.gesture_quiz().is_some_and(|q| q.is_finished()) {
        return;
    }
    if let Some(outcome) = session.finish_gesture_quiz(Instant::now()) {
        println!(
            "{}",
            format!("Quiz score: {} ({}/{})", outcome.score, outcome.correct, outcome.total).cyan()
        );
    }
}

/// Terminal speed sign quiz. One answer per line: an option number or the sign itself.
/// A blank line leaves the prompt unanswered; end of input submits early.
fn run_sign_quiz(session: &mut RecognitionSession, input: impl BufRead, rng: &mut impl Rng) -> Result<QuizOutcome> {
    session.start_sign_quiz(rng, Instant::now());
    let prompts = session.sign_quiz().map(|q| q.prompts().to_vec()).unwrap_or_default();

    println!("{}", "Speed sign quiz: match each description to its sign".cyan());
    let mut lines = input.lines();
    for (i, prompt) in prompts.iter().enumerate() {
        println!("{}", format!("{}. {}", i + 1, prompt.description).bold());
        for (n, option) in prompt.options.iter().enumerate() {
            println!("   {}) {}", n + 1, option);
        }
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if let Some(choice) = parse_choice(&line, &prompt.options) {
            session.answer_sign(i, choice);
        }
    }

    let (outcome, results) = session
        .submit_sign_quiz(Instant::now())
        .context("sign quiz was not running")?;
    for r in &results {
        let answer = r.answer.as_deref().unwrap_or("-");
        if r.correct {
            println!("{} {}", "✓".green(), r.sign);
        } else {
            println!("{} {} (answered {})", "✗".red(), r.sign, answer);
        }
    }
    println!(
        "{}",
        format!("Quiz score: {} ({}/{})", outcome.score, outcome.correct, outcome.total).cyan()
    );
    Ok(outcome)
}

fn parse_choice(line: &str, options: &[&str]) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.parse::<usize>() {
        Ok(n) => options.get(n.checked_sub(1)?).map(|s| s.to_string()),
        Err(_) => Some(line.to_lowercase()),
    }
}

fn export(session: &RecognitionSession, path: &Path) -> Result<()> {
    let bytes = session.confirmed().export_csv()?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{}", format!("Exported {} gestures to {}", session.confirmed().len(), path.display()).green());
    Ok(())
}

use anyhow::Result;
use colored::*;
use std::env;
use std::path::Path;

use signsight::inference::build_session;
use signsight::labels::{LABELS, LABEL_COUNT, LABEL_TABLE_VERSION};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: inspect_model <path_to_model.onnx>");
        return Ok(());
    }

    let model_path = Path::new(&args[1]);
    println!("Inspecting model: {}", model_path.display());
    let session = build_session(model_path, 1)?;

    println!("\n--- Inputs ---");
    for (i, input) in session.inputs.iter().enumerate() {
        println!("#{}: Name: {}", i, input.name);
        println!("    Type: {:?}", input.input_type);
    }

    println!("\n--- Outputs ---");
    for (i, output) in session.outputs.iter().enumerate() {
        println!("#{}: Name: {}", i, output.name);
        println!("    Type: {:?}", output.output_type);
    }

    // Classifier check: the last output dimension must match the label table.
    let width = session
        .outputs
        .first()
        .and_then(|o| o.output_type.tensor_shape())
        .and_then(|shape| shape.last().copied());
    println!("\nLabel table v{} ({} labels)", LABEL_TABLE_VERSION, LABEL_COUNT);
    match width {
        Some(w) if w == LABEL_COUNT as i64 => {
            println!("{}", "Output width matches the label table".green());
            for (i, label) in LABELS.iter().enumerate() {
                println!("  {:>2}: {}", i, label);
            }
        }
        Some(w) => println!("{}", format!("Output width {} does not match {} labels", w, LABEL_COUNT).red()),
        None => println!("{}", "Output width not declared by the model".yellow()),
    }

    Ok(())
}

use std::env;
use std::process;

use rand::rngs::StdRng;
use rand::SeedableRng;

use nuance::types::Parameters;
use nuance::{arg_parse, song};

fn main() {
    let mut args: Vec<String> = env::args().collect();
    let dry = args.iter().any(|a| a == "--dry-run");
    args.retain(|a| a != "--dry-run");

    if (dry && args.len() < 2) || (!dry && args.len() < 4) {
        eprintln!(
            r#"Usage: nuance "/abs/to/digest.json" "/abs/to/input.wav" "/abs/to/output.wav" [samples_dir] [params.json]
       nuance --dry-run "/abs/to/digest.json" [params.json]"#
        );
        process::exit(1);
    }

    let digest_path = &args[1];
    let mut rng = StdRng::from_entropy();

    if dry {
        let params = match args.get(2) {
            Some(path) => load_params_or_exit(path),
            None => Parameters::default(),
        };
        if let Err(msg) = song::dry_run(digest_path, &params, &mut rng) {
            eprintln!("Problem while scheduling: {}", msg);
            process::exit(1);
        }
        return;
    }

    let input_path = &args[2];
    let output_path = &args[3];
    let samples_dir = args.get(4).cloned().unwrap_or_else(|| "samples".to_string());
    let params = match args.get(5) {
        Some(path) => load_params_or_exit(path),
        None => Parameters::default(),
    };

    match song::process_track(digest_path, input_path, output_path, &samples_dir, &params, &mut rng) {
        Ok(_) => {
            println!("{}", output_path)
        }
        Err(msg) => {
            eprintln!("Problem while writing {}: {}", output_path, msg);
            process::exit(1);
        }
    }
}

fn load_params_or_exit(path: &str) -> Parameters {
    match arg_parse::load_params_from_file(path) {
        Ok(params) => params,
        Err(msg) => {
            eprintln!("Failed to load parameters: {}", msg);
            process::exit(1);
        }
    }
}

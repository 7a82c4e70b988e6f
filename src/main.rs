use std::path::PathBuf;

mod keymap;
mod run;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let trace = args.iter().any(|arg| arg == "--trace");
    let rom = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .expect("usage: vm8 <ROM> [--trace]");

    if let Err(e) = run::run(PathBuf::from(rom), trace) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

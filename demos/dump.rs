use std::env;
use std::process;

use scenarist::parse_scc_from_file;

fn print_usage() {
    println!("dump file.scc\n");
}

fn main() {
    if env::args().count() != 2 {
        print_usage();
        process::exit(1);
    }
    let input_filename = env::args().nth(1).unwrap();
    match parse_scc_from_file(&input_filename) {
        Ok(captions) => {
            for lang in captions.get_languages() {
                println!("language: {}", lang);
                for caption in captions.get_captions(lang) {
                    println!("{}", caption);
                }
            }
        }
        Err(err) => {
            println!("Error: {}\n", err);
            process::exit(1);
        }
    }
}

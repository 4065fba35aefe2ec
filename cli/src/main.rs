use anyhow::Result;
use clap::Parser;
use qa_core::persist::content_hash;
use qa_core::QaEngine;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::{fmt, EnvFilter};

mod source;

#[derive(Parser)]
#[command(name = "qa")]
#[command(about = "Interactive question answering over a local corpus", long_about = None)]
struct Args {
    /// Corpus file with question/answer records
    #[arg(long, default_value = "qa_data.json")]
    corpus: String,
    /// Synonym file with canonical/synonym records
    #[arg(long, default_value = "synonyms.json")]
    synonyms: String,
    /// Binary index cache path
    #[arg(long, default_value = "qa_cache.bin")]
    cache: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);
    let mut engine = QaEngine::new(seed);

    match source::read_synonym_records(Path::new(&args.synonyms)) {
        Ok(records) => {
            tracing::info!(count = records.len(), path = %args.synonyms, "synonyms loaded");
            engine.load_synonyms(&records);
        }
        Err(err) => tracing::warn!(%err, path = %args.synonyms, "no synonyms loaded"),
    }

    let corpus_hash = content_hash(&fs::read(&args.corpus).unwrap_or_default());
    let synonym_hash = content_hash(&fs::read(&args.synonyms).unwrap_or_default());
    let cache_path = Path::new(&args.cache);

    if engine.try_load_cache(cache_path, &corpus_hash, &synonym_hash) {
        println!("Loaded cached indexes from: {}", args.cache);
    } else {
        match source::read_qa_records(Path::new(&args.corpus)) {
            Ok(records) => {
                engine.load_corpus(records);
                println!("Loaded corpus: {}", args.corpus);
                match engine.save_cache(cache_path, &corpus_hash, &synonym_hash) {
                    Ok(()) => println!("Saved cache to: {}", args.cache),
                    Err(err) => tracing::warn!(%err, path = %args.cache, "failed to save cache"),
                }
            }
            Err(err) => {
                tracing::warn!(%err, path = %args.corpus, "starting with an empty corpus");
            }
        }
    }

    print_stats(&engine);
    repl(&mut engine, &args)
}

fn print_stats(engine: &QaEngine) {
    let stats = engine.stats();
    println!("=== System stats ===");
    println!("Questions: {}", stats.documents);
    println!("Vocab: {}", stats.vocabulary);
    println!(
        "Bigram entries: {}, Trigram entries: {}",
        stats.bigram_entries, stats.trigram_entries
    );
    println!("Avg doc len: {:.2}", stats.avg_doc_len);
    println!("Synonym mappings: {}", stats.synonyms);
    println!("State: {}", stats.state);
}

fn repl(engine: &mut QaEngine, args: &Args) -> Result<()> {
    println!();
    println!("Commands:");
    println!("  /add question<TAB>answer1|answer2|...  add an entry");
    println!("  /train                                 retrain indexes and rewrite the cache");
    println!("  exit | quit");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);

        match line {
            "" => continue,
            "exit" | "quit" => {
                println!("Bye!");
                break;
            }
            "/train" => {
                engine.retrain();
                let corpus_hash = content_hash(&fs::read(&args.corpus).unwrap_or_default());
                let synonym_hash = content_hash(&fs::read(&args.synonyms).unwrap_or_default());
                match engine.save_cache(Path::new(&args.cache), &corpus_hash, &synonym_hash) {
                    Ok(()) => println!("Trained and saved cache."),
                    Err(err) => println!("Trained but failed to save cache: {err:#}"),
                }
                print_stats(engine);
            }
            _ if line.starts_with("/add ") => {
                let rest = &line["/add ".len()..];
                let (question, answers_raw) = rest.split_once('\t').unwrap_or((rest, ""));
                if question.is_empty() {
                    println!("Format: /add question<TAB>answer1|answer2|...");
                    continue;
                }
                let answers: Vec<String> = answers_raw
                    .split('|')
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect();
                engine.add_document(question, answers);
                println!("Added entry (run /train to rebuild indexes and update the cache).");
            }
            query => {
                let started = Instant::now();
                let reply = engine.answer(query);
                let elapsed = started.elapsed();
                println!("AI: {}", reply.text);
                println!(
                    "[confidence: {:.2}, time: {:.2} ms]",
                    reply.confidence,
                    elapsed.as_secs_f64() * 1000.0
                );
            }
        }
    }
    Ok(())
}

use std::io::{self, Write};
use std::sync::Arc;

use docqa_core::config::{expand_path, Config};
use docqa_core::error::Error;
use docqa_core::routing::RoutingTable;
use docqa_core::types::{Answer, PartitionId, ProviderKind, QueryRequest, QuestionType, Topic};
use docqa_embed::provider_for;
use docqa_engine::classify::{QuestionTypeClassifier, TopicClassifier};
use docqa_engine::{IndexBuilder, OllamaClient, PartitionHandle, QaPipeline, RetrievalEngine};
use docqa_index::{open_db, LancePartition};
use docqa_ingest::builder::ChunkStoreBuilder;

fn prompt_line(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_optional(label: &str) -> anyhow::Result<Option<String>> {
    let line = prompt_line(label)?;
    Ok(if line.is_empty() { None } else { Some(line) })
}

fn prompt_yes_no(label: &str) -> anyhow::Result<bool> {
    let line = prompt_line(label)?;
    Ok(matches!(line.to_lowercase().as_str(), "y" | "yes"))
}

async fn build_partition_handle(
    conn: &lancedb::Connection,
    partition: PartitionId,
    kind: ProviderKind,
    settings: &docqa_core::config::Settings,
) -> anyhow::Result<PartitionHandle> {
    let provider = provider_for(kind, &settings.embedding)?;
    let store = LancePartition::new(conn.clone(), partition, provider.dim());
    Ok(PartitionHandle { store: Arc::new(store), provider })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;

    println!("📚 Document Question Answering");
    println!("==============================");

    let llm = Arc::new(OllamaClient::new(&settings.llm));
    if !llm.health_check().await {
        eprintln!(
            "❌ Language model unreachable at {}. Start it and try again.",
            settings.llm.base_url
        );
        std::process::exit(1);
    }

    let index_dir = expand_path(&settings.data.index_dir);
    let conn = open_db(&index_dir.to_string_lossy()).await?;
    let remote =
        build_partition_handle(&conn, PartitionId::Remote, ProviderKind::Remote, &settings).await?;
    let local =
        build_partition_handle(&conn, PartitionId::Local, ProviderKind::Local, &settings).await?;

    let routing = RoutingTable::from_settings(&settings.routing)?;
    let chunk_builder = ChunkStoreBuilder::new(settings.chunking, settings.routing.clone());
    let index_builder =
        IndexBuilder::new(chunk_builder, routing.clone(), remote.clone(), local.clone());

    let force = prompt_yes_no("Rebuild document indexes from scratch? [y/N] ")?;
    let docs_dir = expand_path(&settings.data.docs_dir);
    index_builder.rebuild_all(&docs_dir, force).await?;
    println!("✅ Indexes ready");
    println!();

    let default_topic: Topic = settings
        .llm
        .default_topic
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("bad llm.default_topic '{}'", settings.llm.default_topic)))?;
    let retrieval = RetrievalEngine::new(remote, local, routing, settings.retrieval);
    let pipeline = QaPipeline::new(
        QuestionTypeClassifier::new(llm.clone()),
        TopicClassifier::new(llm.clone(), default_topic),
        retrieval,
        llm,
    );

    println!("Ask a question, or type 'exit' to quit.");
    println!("Optional restrictions are prompted after each question; leave blank to skip.");
    loop {
        println!();
        let text = prompt_line("❓ Question: ")?;
        if text.is_empty() {
            continue;
        }
        if matches!(text.to_lowercase().as_str(), "exit" | "quit") {
            println!("👋 Goodbye");
            break;
        }

        let filename = prompt_optional("📄 Restrict to filename (blank for all): ")?;
        let topic = match prompt_optional("🏷️  Topic override (blank to infer): ")? {
            Some(raw) => match raw.parse::<Topic>() {
                Ok(topic) => Some(topic),
                Err(e) => {
                    eprintln!("❌ {e}");
                    continue;
                }
            },
            None => None,
        };
        let question_type = match prompt_optional("🔎 Question type override (blank to infer): ")? {
            Some(raw) => match raw.parse::<QuestionType>() {
                Ok(qtype) => Some(qtype),
                Err(e) => {
                    eprintln!("❌ {e}");
                    continue;
                }
            },
            None => None,
        };

        let request = QueryRequest { text, filename, topic, question_type };
        match pipeline.answer_query(&request).await {
            Ok(Answer::Grounded(answer)) => {
                println!();
                println!("💬 {answer}");
            }
            Ok(Answer::Fallback(message)) => {
                println!();
                println!("💬 {message}");
            }
            Err(Error::InvalidInput(message)) => eprintln!("❌ {message}"),
            Err(e) => eprintln!("❌ Query failed: {e}"),
        }
    }

    Ok(())
}

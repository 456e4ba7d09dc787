use anyhow::Context as _;
use clap::Parser;
use structmirror::{EntityObserver, EventSink, Mirror, MirrorConfig, ObserverEvent, RecordObserver};
use tracing::info;

mod cli;
mod model;

use cli::{Cli, OutputFormat};
use model::Comment;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            MirrorConfig::from_toml_str(&text)?
        }
        None => MirrorConfig::default(),
    };
    if cli.updates_only {
        config.observer.deliver_inserts = false;
    }
    let mirror = Mirror::with_config(model::model(), config);

    // Entity observer: events are forwarded to an async printer task.
    let followed: EntityObserver<Comment> =
        mirror.observe_entity("Comment", "id", cli.watch.as_str())?;
    let (sink, mut rx) = EventSink::channel();
    followed.set_event_sink(sink);
    let format = cli.format.clone();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event("entity", &event, &format);
        }
    });

    let mut records = Vec::with_capacity(cli.comments);
    for i in 1..=cli.comments {
        records.push(mirror.store(&Comment::new(format!("C{i}"), format!("comment {i}")))?);
    }
    mirror.save()?;
    tokio::task::yield_now().await;

    // Record observer on the first comment: callbacks run inline on save.
    let pinned: Option<RecordObserver<Comment>> = match records.first() {
        Some(first) => {
            let observer: RecordObserver<Comment> = mirror.observe_record(first.clone())?;
            let format = cli.format.clone();
            observer.set_event_sink(
                EventSink::new()
                    .on_updated({
                        let format = format.clone();
                        move |c: &Comment| {
                            print_event("record", &ObserverEvent::Updated(c.clone()), &format)
                        }
                    })
                    .on_deleted(move || print_event::<Comment>("record", &ObserverEvent::Deleted, &format)),
            );
            Some(observer)
        }
        None => None,
    };

    for record in &records {
        let text = record.field("text")?.as_str().unwrap_or_default().to_string();
        mirror.context().set(record, "text", format!("{text} (edited)"))?;
    }
    mirror.save()?;
    tokio::task::yield_now().await;

    if let Some(watched) = mirror.context().find_first("Comment", "id", &cli.watch.as_str().into())? {
        mirror.context().delete(&watched)?;
        mirror.save()?;
        tokio::task::yield_now().await;
    }

    mirror.store(&Comment::new(cli.watch.clone(), "back again"))?;
    mirror.save()?;

    if let Some(observer) = &pinned {
        info!(value = ?observer.value(), "record observer final value");
    }
    info!(current = ?followed.fetch_current(mirror.context())?, "entity observer final value");

    drop(pinned);
    drop(followed);
    printer.await?;
    Ok(())
}

fn print_event<T: serde::Serialize>(source: &str, event: &ObserverEvent<T>, format: &OutputFormat) {
    let (kind, value, error) = match event {
        ObserverEvent::Inserted(v) => ("inserted", Some(v), None),
        ObserverEvent::Updated(v) => ("updated", Some(v), None),
        ObserverEvent::Deleted => ("deleted", None, None),
        ObserverEvent::DecodeFailed(err) => ("decode-failed", None, Some(err.to_string())),
    };
    match format {
        OutputFormat::Text => match (value, error) {
            (Some(v), _) => println!(
                "[{source}] {kind}: {}",
                serde_json::to_string(v).unwrap_or_default()
            ),
            (None, Some(err)) => println!("[{source}] {kind}: {err}"),
            (None, None) => println!("[{source}] {kind}"),
        },
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "source": source,
                "event": kind,
                "value": value,
                "error": error,
            })
        ),
    }
}

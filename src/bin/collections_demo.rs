//! 集合门面演示
//!
//! 不指定 `--addr` 时使用进程内后端。

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use redis_collections::{
    CollectionConfig, KeyedCollection, LiveBackend, LiveConfig, MapCollection, MemoryBackend,
    SetCollection, SortedSetCollection, Store, Structure,
};

#[derive(Parser, Debug)]
#[command(name = "collections-demo")]
#[command(about = "Typed Redis collections with single round-trip structure resolution")]
struct Args {
    /// Redis 服务端地址，省略时使用内存后端
    #[arg(short, long)]
    addr: Option<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = match &args.addr {
        Some(addr) => {
            info!("Using live backend at {}", addr);
            Store::new(LiveBackend::connect(LiveConfig::new(addr.clone())).await?)
        }
        None => {
            info!("Using in-memory backend");
            Store::new(MemoryBackend::new())
        }
    };

    let users = MapCollection::new(
        CollectionConfig::new("user:${id}").with_fields(["name", "age"]),
        1,
    )?;
    let settings = MapCollection::new("settings:${id}", 1)?;
    let friends = SetCollection::new("user:${id}:friends", 1)?;
    let scores = SortedSetCollection::new("scores:${board}", 1)?;

    // 写入同样可以组成一个批次
    store
        .resolve(Structure::seq([
            users.set_all("U1", [("name", "Ada"), ("age", "36")])?,
            users.set_all("U2", [("name", "Alan"), ("age", "41")])?,
            settings.set("U1", "theme", "dark")?,
            friends.add("U1", "U2")?,
            scores.put("weekly", 120.0, "U1")?,
            scores.put("weekly", 95.5, "U2")?,
        ]))
        .await?;

    let profile = Structure::map([
        ("user", Structure::from(users.get_map("U1")?)),
        ("settings", settings.get_map("U1")?.into()),
        ("friends", friends.get_list("U1")?.into()),
        ("top", scores.get_top("weekly", 3, true)?.into()),
        ("version", Structure::from(1i64)),
    ]);
    let resolved = store.resolve(profile).await?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);

    let keys = store.resolve(users.find_keys(())?).await?;
    info!("User keys: {}", keys);

    let members = store.resolve(friends.iterate_list("U1")?).await?;
    info!("Friends of U1 via SSCAN: {}", members);

    Ok(())
}

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tiku_query::providers::ProviderRegistry;
use tiku_query::services::QueryService;
use tiku_query::store::JsonFileStore;
use tiku_query::{logger, Config, QueryRequest};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config_path = std::env::var("TIKU_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = Arc::new(Config::load(Path::new(&config_path))?);

    // 初始化题库与提供商注册表
    let store = Arc::new(JsonFileStore::open(&config.bank_file)?);
    let registry = Arc::new(ProviderRegistry::new(config.clone()));
    let service = QueryService::new(store, registry);

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("--providers") => {
            let status = service.providers_status();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Some("--stats") => {
            let stats = service.statistics();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Some(_) => {
            let title = args[0].clone();
            let options = args.get(1).cloned().unwrap_or_default();
            let question_type = args.get(2).cloned().unwrap_or_default();

            let request = QueryRequest::new(title, options, question_type)?;
            let result = service.query_answer(&request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        None => {
            eprintln!("用法: tiku_query <问题标题> [选项] [类型]");
            eprintln!("      tiku_query --providers   查看提供商状态");
            eprintln!("      tiku_query --stats       查看题库统计");
            std::process::exit(2);
        }
    }

    Ok(())
}

use std::process::ExitCode;

use sub_recode::cli::process_args;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match process_args(args) {
        Ok(summary) => {
            log::info!("程式執行完成");
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("轉換失敗：{err}");
            ExitCode::FAILURE
        }
    }
}

//! 旅行搭子 CLI 客户端（测试版）
//!
//! 非交互式 CLI：启动时登录，执行一个子命令并输出结果。
//! `chat` 子命令会打开行程聊天室并持续打印收到的消息。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use travel_buddy_sdk::travel::buddy::{BuddyListener, BuddyMatch};
use travel_buddy_sdk::travel::chat::{ChatListener, ChatMessage};
use travel_buddy_sdk::travel::types::{TripId, UserId};
use travel_buddy_sdk::{ClientConfig, TravelClient};

/// 旅行搭子 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "travel-cli")]
#[command(about = "旅行搭子 CLI 客户端 - 用于测试和展示 SDK 功能", long_about = None)]
struct Args {
    /// 登录邮箱
    #[arg(long, env = "TRAVEL_EMAIL")]
    email: String,

    /// 登录密码
    #[arg(long, env = "TRAVEL_PASSWORD")]
    password: String,

    /// 日志级别（默认: info,travel_buddy_sdk=debug）
    #[arg(long, default_value = "info,travel_buddy_sdk=debug")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出匹配的搭子
    Matches {
        #[arg(long, default_value = "10")]
        limit: u32,
        #[arg(long, default_value = "0")]
        min_score: f64,
    },
    /// 向用户发送搭子请求
    Request { user: UserId },
    /// 撤回发给用户的请求
    Cancel { user: UserId },
    /// 接受用户发来的请求
    Accept { user: UserId },
    /// 拒绝用户发来的请求
    Reject { user: UserId },
    /// 解除搭子关系
    Disconnect { user: UserId },
    /// 我的行程
    Trips,
    /// 行程详情与成员
    Trip { id: TripId },
    /// 邀请搭子加入行程
    Invite { trip: TripId, user: UserId },
    /// 待处理的行程邀请
    Invitations,
    /// 打开行程聊天室并打印消息
    Chat {
        trip: TripId,
        /// 运行时长（秒），0 表示持续运行
        #[arg(short, long, default_value = "0")]
        duration: u64,
    },
    /// 通知列表
    Notifications,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .context("无法创建日志文件 debug.log")?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 文件不需要颜色
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
    Ok(())
}

/// 设置监听器（输出所有接收到的信息）
fn setup_listeners(client: &mut TravelClient) {
    struct CliBuddyListener;
    #[async_trait::async_trait]
    impl BuddyListener for CliBuddyListener {
        async fn on_matches_changed(&self, matches: Vec<BuddyMatch>) {
            info!("[CLI/Buddy] 🔄 匹配列表变更: {} 人", matches.len());
        }

        async fn on_buddy_error(&self, message: String) {
            error!("[CLI/Buddy] ❌ {}", message);
        }
    }
    client.set_buddy_listener(Arc::new(CliBuddyListener));

    struct CliChatListener;
    #[async_trait::async_trait]
    impl ChatListener for CliChatListener {
        async fn on_message(&self, message: ChatMessage) {
            let sender = if message.is_system {
                "系统"
            } else {
                message.sender_name.as_deref().unwrap_or("?")
            };
            info!("[CLI/Chat] 📨 {}: {}", sender, message.content);
        }

        async fn on_typing(&self, _user_id: UserId, user_name: String, is_typing: bool) {
            if is_typing {
                info!("[CLI/Chat] ⌨️ {} 正在输入...", user_name);
            }
        }

        async fn on_error(&self, message: String) {
            error!("[CLI/Chat] ❌ {}", message);
        }

        async fn on_connected(&self) {
            info!("[CLI/Chat] 🔗 已连接");
        }

        async fn on_disconnected(&self) {
            warn!("[CLI/Chat] 🔗 连接已断开");
        }
    }
    client.set_chat_listener(Arc::new(CliChatListener));
}

fn print_matches(matches: &[BuddyMatch]) {
    info!("[CLI] 👥 匹配列表（共 {} 人）:", matches.len());
    for m in matches {
        info!(
            "[CLI]   - {} ({}) | 匹配度: {:.2} | 状态: {:?} | 共同兴趣: {}",
            m.matched_user_name,
            m.matched_user_id,
            m.match_score,
            m.request_status,
            m.shared_interests.join(", ")
        );
    }
}

async fn run(client: &TravelClient, command: Command) -> Result<()> {
    let buddies = client.buddies();
    match command {
        Command::Matches { limit, min_score } => {
            let matches = buddies.fetch_matches(limit, min_score).await?;
            print_matches(&matches);
        }
        Command::Request { user } => {
            buddies.fetch_matches(50, 0.0).await?;
            let request = buddies.send_request(user).await?;
            info!("[CLI] ✅ 已发送请求 #{} 给 {}", request.id, request.receiver_name);
        }
        Command::Cancel { user } => {
            buddies.fetch_matches(50, 0.0).await?;
            buddies.cancel_request(user).await?;
            info!("[CLI] ✅ 已撤回发给 {} 的请求", user);
        }
        Command::Accept { user } => {
            buddies.fetch_matches(50, 0.0).await?;
            buddies.accept_request(user).await?;
            info!("[CLI] ✅ 已接受 {} 的请求", user);
        }
        Command::Reject { user } => {
            buddies.fetch_matches(50, 0.0).await?;
            buddies.reject_request(user).await?;
            info!("[CLI] ✅ 已拒绝 {} 的请求", user);
        }
        Command::Disconnect { user } => {
            buddies.fetch_matches(50, 0.0).await?;
            buddies.disconnect(user).await?;
            info!("[CLI] ✅ 已与 {} 解除搭子关系", user);
        }
        Command::Trips => {
            let catalog = client.catalog();
            let trips = catalog.list_trips().await?;
            info!("[CLI] 🧳 行程（共 {} 个）:", trips.len());
            for trip in &trips {
                info!(
                    "[CLI]   - #{} {} | {} | {} ~ {} | {:?}",
                    trip.id,
                    trip.title,
                    trip.destination_label(),
                    trip.start_date,
                    trip.end_date,
                    trip.status
                );
            }
            if let Ok(stats) = catalog.dashboard_stats().await {
                info!(
                    "[CLI] 📊 创建 {} 个，参与 {} 个",
                    stats.trips_created, stats.trips_joined
                );
            }
        }
        Command::Trip { id } => {
            let manager = client.trip(id);
            let trip = manager.fetch_trip().await?;
            info!("[CLI] 🧳 #{} {} ({})", trip.id, trip.title, trip.destination_label());
            for m in &trip.members {
                info!(
                    "[CLI]   - {} <{}> | {:?} | {:?}",
                    m.full_name, m.email, m.role, m.status
                );
            }
            info!(
                "[CLI] 我是创建者: {}, 可离开: {}",
                manager.is_creator().await,
                manager.can_leave().await
            );
        }
        Command::Invite { trip, user } => {
            let manager = client.trip(trip);
            manager.fetch_trip().await?;
            manager.invite_member(user).await?;
            let members = manager.trip().await.map_or(0, |t| t.members.len());
            info!("[CLI] ✅ 已邀请 {}，当前成员 {} 人", user, members);
        }
        Command::Invitations => {
            let inbox = client.invitations();
            let items = inbox.refresh().await?;
            info!("[CLI] ✉️ 待处理邀请（共 {} 个）:", items.len());
            for inv in &items {
                info!(
                    "[CLI]   - 行程 #{} {} | {} | 来自 {}",
                    inv.trip_id, inv.title, inv.destination, inv.creator_name
                );
            }
        }
        Command::Chat { trip, duration } => {
            let manager = client.trip(trip);
            manager.fetch_trip().await?;
            let membership = manager.my_membership().await.map(|m| m.status);

            let mut room = client.chat_room(trip);
            let gate = room.open(membership).await.clone();
            info!("[CLI] 💬 聊天室状态: {:?}", gate);
            for message in room.messages() {
                info!(
                    "[CLI]   [{}] {}: {}",
                    message.created_at,
                    message.sender_name.as_deref().unwrap_or("系统"),
                    message.content
                );
            }

            if duration > 0 {
                info!("[CLI] ⏰ {} 秒后自动退出", duration);
                sleep(Duration::from_secs(duration)).await;
            } else {
                info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
                tokio::signal::ctrl_c().await.context("等待 Ctrl+C 失败")?;
            }
            room.close().await;
        }
        Command::Notifications => {
            let center = client.notifications();
            let items = center.refresh().await?;
            info!(
                "[CLI] 🔔 通知（共 {} 条，未读 {} 条）:",
                items.len(),
                center.unread_count().await
            );
            let now = chrono::Utc::now();
            for n in &items {
                info!(
                    "[CLI]   - {} {} | {}",
                    if n.is_read { " " } else { "●" },
                    n.message,
                    n.time_ago(now)
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClientConfig::from_env();
    let args = Args::parse();

    init_logger(&args.log_level)?;

    info!("[CLI] 🚀 旅行搭子 CLI 客户端（测试模式）");
    info!("[CLI] 🌐 API: {}", config.api_base_url);

    let mut client = TravelClient::new(config).context("创建客户端失败")?;
    setup_listeners(&mut client);

    info!("[CLI] 🔐 正在登录: {}", args.email);
    let auth = client
        .login(&args.email, &args.password)
        .await
        .context("登录失败")?;
    info!("[CLI] ✅ 登录成功！用户: {} ({})", auth.user.full_name, auth.user.id);

    let result = run(&client, args.command).await;
    client.logout();
    if let Err(e) = &result {
        error!("[CLI] ❌ {:#}", e);
    }
    info!("[CLI] 👋 程序退出");
    result
}

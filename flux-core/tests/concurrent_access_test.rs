//! Concurrent access tests
//!
//! Several request handlers share one `FluxContext`. Every read-modify-write
//! on a sheet goes through the repository's write lock, so concurrent
//! transfers must neither lose updates nor create or destroy money.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;
use tempfile::TempDir;

use rust_decimal::Decimal;

use flux_core::adapters::memory::MemoryStore;
use flux_core::adapters::xlsx::XlsxStore;
use flux_core::config::Config;
use flux_core::services::SessionInfo;
use flux_core::{Error, FluxContext, NewUser, User};

/// Number of concurrent threads for stress tests
const THREAD_COUNT: usize = 6;

/// Number of iterations per thread
const ITERATIONS_PER_THREAD: usize = 5;

const STARTING_BALANCE: i64 = 1000;

fn create_test_user(ctx: &FluxContext, username: &str) -> User {
    let user = ctx
        .account_service
        .signup(NewUser {
            username: username.to_string(),
            password: "pw".to_string(),
            full_name: Some(format!("User {}", username)),
            ..Default::default()
        })
        .unwrap();
    ctx.transaction_service
        .deposit(
            &user.account_id,
            Decimal::from(STARTING_BALANCE),
            None,
            &SessionInfo::default(),
        )
        .unwrap();
    user
}

/// Every thread transfers around a ring of accounts; returns the number of
/// successful transfers
fn run_transfer_ring(ctx: Arc<FluxContext>, users: Arc<Vec<User>>) -> usize {
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let success_count = Arc::new(AtomicUsize::new(0));
    let error_count = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];

    for thread_id in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let ctx = Arc::clone(&ctx);
        let users = Arc::clone(&users);
        let success_count = Arc::clone(&success_count);
        let error_count = Arc::clone(&error_count);

        let handle = thread::spawn(move || {
            barrier.wait();
            let start = Instant::now();

            for i in 0..ITERATIONS_PER_THREAD {
                let sender = &users[(thread_id + i) % users.len()];
                let recipient = &users[(thread_id + i + 1) % users.len()];
                let amount = Decimal::from((thread_id * 7 + i * 3 + 1) as i64);

                match ctx.transaction_service.transfer(
                    &sender.account_id,
                    amount,
                    &recipient.account_number,
                    &recipient.ifsc,
                    &SessionInfo::default(),
                ) {
                    Ok(_) => {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(Error::InsufficientFunds) => {}
                    Err(e) => {
                        eprintln!("Thread {}: transfer error at iteration {}: {}", thread_id, i, e);
                        error_count.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
            println!(
                "Thread {}: Completed {} iterations in {:?}",
                thread_id,
                ITERATIONS_PER_THREAD,
                start.elapsed()
            );
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let total_errors = error_count.load(Ordering::SeqCst);
    assert_eq!(
        total_errors, 0,
        "Expected 0 errors but got {}. This indicates race conditions.",
        total_errors
    );
    success_count.load(Ordering::SeqCst)
}

fn assert_money_conserved(ctx: &FluxContext, users: &[User]) {
    let total: Decimal = ctx
        .admin_service
        .users()
        .unwrap()
        .iter()
        .map(|u| u.account_balance)
        .sum();
    assert_eq!(total, Decimal::from(STARTING_BALANCE * users.len() as i64));

    for user in ctx.admin_service.users().unwrap() {
        assert!(user.account_balance >= Decimal::ZERO, "{} went negative", user.account_id);
    }
}

/// Test: concurrent transfers over the in-memory store
#[test]
fn test_concurrent_transfers_conserve_money() {
    let config = Config::defaults(std::path::Path::new("."));
    let ctx = Arc::new(FluxContext::with_store(config, Arc::new(MemoryStore::with_schema())));
    let users: Vec<User> = (0..4).map(|i| create_test_user(&ctx, &format!("user{}", i))).collect();
    let users = Arc::new(users);

    let successes = run_transfer_ring(Arc::clone(&ctx), Arc::clone(&users));
    println!("Successful transfers: {}", successes);

    assert_money_conserved(&ctx, &users);

    // Each transfer writes a debit and a credit entry, plus one deposit per user
    let logs = ctx.activity_service.all().unwrap();
    assert_eq!(logs.len(), users.len() + successes * 2);
}

/// Test: concurrent transfers persisted to a workbook on disk
#[test]
fn test_concurrent_transfers_on_workbook() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::defaults(temp_dir.path());
    let store = XlsxStore::create(&config.db_file, false).unwrap();
    let ctx = Arc::new(FluxContext::with_store(config.clone(), Arc::new(store)));
    let users: Vec<User> = (0..3).map(|i| create_test_user(&ctx, &format!("user{}", i))).collect();
    let users = Arc::new(users);

    run_transfer_ring(Arc::clone(&ctx), Arc::clone(&users));

    // Verify integrity by reopening the file
    let reopened = FluxContext::with_store(
        config.clone(),
        Arc::new(XlsxStore::open(&config.db_file).unwrap()),
    );
    assert_money_conserved(&reopened, &users);
}

/// Test: log IDs stay unique when many threads append at once
#[test]
fn test_concurrent_activity_ids_are_unique() {
    let config = Config::defaults(std::path::Path::new("."));
    let ctx = Arc::new(FluxContext::with_store(config, Arc::new(MemoryStore::with_schema())));
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));

    let mut handles = vec![];
    for thread_id in 0..THREAD_COUNT {
        let ctx = Arc::clone(&ctx);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..ITERATIONS_PER_THREAD {
                ctx.activity_service
                    .log(
                        flux_core::ActivityLog::new(format!("AC{}", 1001 + thread_id))
                            .with_description(format!("event {}", i)),
                    )
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let logs = ctx.activity_service.all().unwrap();
    let mut ids: Vec<&str> = logs.iter().map(|l| l.log_id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), THREAD_COUNT * ITERATIONS_PER_THREAD);
}

//! S1 (create/start/stop/delete round trip), S4 (duplicate name rejection),
//! and S6 (stop idempotence) from spec.md §8.

use crate::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;

/// Bind an ephemeral TCP echo fixture and return its port. The listener is
/// leaked into a background thread for the lifetime of the test process.
fn spawn_echo_fixture() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            std::thread::spawn(move || {
                let mut buf = [0u8; 1024];
                loop {
                    let n = match stream.read(&mut buf) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    if stream.write_all(&buf[..n]).is_err() {
                        return;
                    }
                }
            });
        }
    });
    port
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

fn extract_id(stdout: &str) -> u64 {
    stdout
        .lines()
        .find_map(|l| l.strip_prefix("id:"))
        .map(|rest| rest.trim())
        .expect("create output should contain an id: line")
        .parse()
        .expect("id should be numeric")
}

#[test]
fn create_start_stop_delete_round_trip() {
    let sup = Supervisor::empty();
    let echo_port = spawn_echo_fixture();
    let listen_port = free_port();

    let created = sup
        .cli()
        .args(&[
            "create",
            "--name",
            "t1",
            "--kind",
            "reverse-tcp",
            "--listen",
            &format!("127.0.0.1:{listen_port}"),
            "--remote",
            &format!("127.0.0.1:{echo_port}"),
        ])
        .passes();
    let id = extract_id(&created.stdout()).to_string();

    sup.cli().args(&["start", &id]).passes();
    assert!(wait_for_port(listen_port), "listener should bind within the wait window");

    let mut client = std::net::TcpStream::connect(("127.0.0.1", listen_port)).unwrap();
    client.write_all(b"ping\n").unwrap();
    let mut buf = [0u8; 16];
    let n = client.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"ping\n");
    drop(client);

    sup.cli().args(&["stop", &id]).passes();
    assert!(
        wait_for(WAIT_MAX_MS, || std::net::TcpStream::connect(("127.0.0.1", listen_port)).is_err()),
        "listener should be torn down after stop"
    );

    sup.cli().args(&["delete", &id]).passes();
    sup.cli().args(&["get", &id]).fails();
}

#[test]
fn duplicate_name_is_rejected() {
    let sup = Supervisor::empty();
    let listen_port = free_port();

    sup.cli()
        .args(&[
            "create",
            "--name",
            "x",
            "--kind",
            "reverse-tcp",
            "--listen",
            &format!("127.0.0.1:{listen_port}"),
            "--remote",
            "127.0.0.1:9",
        ])
        .passes();

    let other_port = free_port();
    sup.cli()
        .args(&[
            "create",
            "--name",
            "x",
            "--kind",
            "reverse-tcp",
            "--listen",
            &format!("127.0.0.1:{other_port}"),
            "--remote",
            "127.0.0.1:9",
        ])
        .fails()
        .stderr_has("err_duplicate_name");

    let list = sup.cli().args(&["list"]).passes();
    assert_eq!(list.stdout().lines().filter(|l| l.contains(" x ") || l.trim_start().starts_with('x')).count(), 1);
}

#[test]
fn stop_is_idempotent_under_concurrent_callers() {
    let sup = Supervisor::empty();
    let echo_port = spawn_echo_fixture();
    let listen_port = free_port();

    let created = sup
        .cli()
        .args(&[
            "create",
            "--name",
            "t6",
            "--kind",
            "reverse-tcp",
            "--listen",
            &format!("127.0.0.1:{listen_port}"),
            "--remote",
            &format!("127.0.0.1:{echo_port}"),
        ])
        .passes();
    let id = extract_id(&created.stdout()).to_string();

    sup.cli().args(&["start", &id]).passes();
    assert!(wait_for_port(listen_port));

    let mut cmd_a = sup.cli().args(&["stop", &id]).command();
    let mut cmd_b = sup.cli().args(&["stop", &id]).command();
    let t1 = std::thread::spawn(move || cmd_a.status().unwrap().success());
    let t2 = std::thread::spawn(move || cmd_b.status().unwrap().success());
    assert!(t1.join().unwrap(), "first concurrent stop should succeed");
    assert!(t2.join().unwrap(), "second concurrent stop should succeed");

    let get = sup.cli().args(&["get", &id]).passes();
    assert!(get.stdout().contains("Stopped") || get.stdout().to_lowercase().contains("stopped"));
}

use std::str::FromStr;
use std::thread;

use clap::{Arg, Command};
use tracing::{error, info};

use ttsim::data::{EnvironmentChannel, OwnshipChannel};
use ttsim::logging::{init_logging, parse_log_level, LogConfig, LogOutput};
use ttsim::math::vector_from_array;
use ttsim::models::{AircraftModel, Echo, KinematicFlightDynamics, RadarModel};
use ttsim::scenario::ScenarioConfig;
use ttsim::simulation::Simulation;

fn main() {
    let matches = Command::new("ttsim")
        .version("0.1.0")
        .about("段階的ライフサイクル型シミュレーション")
        .long_about("独立したモデルを一つの同期ループで実行するシミュレーション\n\
                     自機の機体運動モデルと搭載レーダーモデルを駆動します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("steps")
                .short('n')
                .long("steps")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("実行するステップ数（シナリオの max_steps を上書き）")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("info")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .get_matches();

    let output = match matches.get_one::<String>("log-output").map(|s| LogOutput::from_str(s)) {
        Some(Ok(output)) => output,
        Some(Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        None => LogOutput::Console,
    };
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or(tracing::Level::INFO);

    let log_config = LogConfig {
        level,
        output,
        ..LogConfig::default()
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("ログ初期化エラー: {}", e);
        std::process::exit(1);
    }

    let Some(scenario_path) = matches.get_one::<String>("scenario") else {
        show_default_help();
        return;
    };

    let steps_override = matches.get_one::<u64>("steps").copied();
    if let Err(e) = run_scenario(scenario_path, matches.get_flag("info"), steps_override) {
        error!("シナリオ実行エラー: {}", e);
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    steps_override: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario = ScenarioConfig::from_file(scenario_path)?;
    info!("シナリオファイル読み込み完了: {}", scenario_path);

    if let Some(steps) = steps_override {
        scenario.sim.max_steps = Some(steps);
    }

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    let echoes = execute_scenario(&scenario);
    print_echoes(&echoes);

    Ok(())
}

/// チャネルとモデルを構成し、専用スレッドでシミュレーションを実行
fn execute_scenario(scenario: &ScenarioConfig) -> Vec<Echo> {
    let ownship_channel = OwnshipChannel::new();
    let environment_channel = EnvironmentChannel::new();

    let ownship = &scenario.ownship;
    let setup = Some("Scenario");
    ownship_channel
        .aircraft_position
        .get_write_handle(setup)
        .set(vector_from_array(ownship.position));
    ownship_channel
        .aircraft_rotation
        .get_write_handle(setup)
        .set(vector_from_array(ownship.rotation));
    ownship_channel
        .aircraft_velocity
        .get_write_handle(setup)
        .set(vector_from_array(ownship.velocity));
    ownship_channel
        .radar_offset
        .get_write_handle(setup)
        .set(vector_from_array(ownship.radar_offset));
    ownship_channel
        .radar_rotation
        .get_write_handle(setup)
        .set(vector_from_array(ownship.radar_rotation));
    environment_channel
        .physical_entities
        .get_write_handle(setup)
        .set(scenario.environment.entities.clone());

    let fdm = KinematicFlightDynamics::new(
        vector_from_array(ownship.position),
        vector_from_array(ownship.velocity),
        scenario.aircraft.dt_s(),
    );
    let mut flight_dynamics = AircraftModel::new(
        &ownship_channel,
        fdm,
        scenario.aircraft.paths(),
        scenario.aircraft.airframe.clone(),
    );
    let mut ship_radar = RadarModel::new(&ownship_channel, &environment_channel, scenario.radar);
    let echo_queue = ship_radar.echo_handle(Some("Main"));

    let mut simulation = Simulation::new();
    // 機体運動を先に更新し、レーダーは最新の自機位置を使う
    simulation.add_model(&mut flight_dynamics);
    simulation.add_model(&mut ship_radar);
    simulation.set_target_state(scenario.sim.target_state);

    let max_steps = scenario.sim.max_steps;
    thread::scope(|scope| {
        let main_thread = scope.spawn(move || {
            info!("=== シミュレーション実行開始 ===");
            match max_steps {
                Some(steps) => {
                    for _ in 0..steps {
                        simulation.step();
                    }
                }
                None => simulation.main(),
            }
            info!("=== シミュレーション終了 (状態: {}) ===", simulation.get_current_state());
        });

        // TODO: コマンド入力ループ（目標状態の変更、自機チャネルへの書き込み）

        if main_thread.join().is_err() {
            error!("シミュレーションスレッドが異常終了しました");
        }
    });

    let echoes: Vec<Echo> = echo_queue.write().drain(..).collect();
    echoes
}

fn print_echoes(echoes: &[Echo]) {
    println!("=== レーダーエコー: {}件 ===", echoes.len());
    for (index, echo) in echoes.iter().enumerate() {
        println!(
            "  #{}: 距離 {:.1}m, 水平角 {:.4}rad, 垂直角 {:.4}rad, 受信電力 {:.3e}W, 視線速度 {:.1}m/s",
            index,
            echo.range,
            echo.horizontal_angle,
            echo.vertical_angle,
            echo.return_power,
            echo.radial_velocity
        );
    }
}

fn show_default_help() {
    println!("使用方法:");
    println!("  ttsim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>    シナリオファイルを指定して実行");
    println!("  -i, --info               シナリオ情報のみ表示");
    println!("  -n, --steps <N>          実行ステップ数を指定");
    println!("      --log-level <LEVEL>  ログレベル");
    println!("      --log-output <TARGET> ログ出力先");
    println!("  -h, --help               このヘルプを表示");
    println!();
    println!("例:");
    println!("  ttsim -s scenarios/radar_demo.yaml");
    println!("  ttsim -s scenarios/radar_demo.yaml -n 50 --log-level debug");
}

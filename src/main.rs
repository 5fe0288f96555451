use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use voice_qa::answer::{Answer, AnswerGenerator};
use voice_qa::config::{Config, Overrides, TtsBackend, WhisperModel};
use voice_qa::leetcode::{
    GraphqlProvider, McpProvider, ProblemQuery, ProviderChain, ProviderLookup,
};
use voice_qa::llm::{LanguageModel, OpenAiBackend};
use voice_qa::orchestrator::{Orchestrator, OrchestratorConfig, WELCOME};
use voice_qa::voice::{
    AudioCapture, AudioPlayback, AudioSample, ConsoleSpeaker, ConsoleTranscriber,
    MicrophoneTranscriber, OpenAiSpeaker, SAMPLE_RATE, SynthesisPort, SystemSpeaker,
    TranscriptionPort, WhisperClient,
};

/// voice-qa - Spoken question answering with LeetCode lookups
#[derive(Parser)]
#[command(name = "voice-qa", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to ~/.config/voice-qa/config.toml)
    #[arg(short, long, env = "VOICE_QA_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to listen per turn
    #[arg(short, long)]
    duration: Option<u64>,

    /// Whisper model size (tiny, base, small, medium, large)
    #[arg(long)]
    whisper_model: Option<WhisperModel>,

    /// Stop after this many turns
    #[arg(long)]
    max_turns: Option<u64>,

    /// Type questions and read answers instead of using audio devices
    #[arg(long)]
    text: bool,

    /// Continue without an AI backend without asking
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Answer one question and exit
    Ask {
        /// The question
        question: String,
        /// Speak the answer as well as printing it
        #[arg(long)]
        speak: bool,
    },
    /// Look up LeetCode data (daily, a slug, user:<name>, submissions:<name> or keywords)
    Lookup {
        /// What to look up
        query: String,
    },
    /// Check speech output, answering and speech input in turn
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,voice_qa=info",
        1 => "info,voice_qa=debug",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        config_path: cli.config,
        capture_secs: cli.duration,
        whisper_model: cli.whisper_model,
        max_turns: cli.max_turns,
    };

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&overrides, &text).await,
            Command::Ask { question, speak } => ask(&overrides, &question, speak).await,
            Command::Lookup { query } => lookup(&overrides, &query).await,
            Command::Check => check(&overrides).await,
        };
    }

    let config = Config::load(&overrides)?;
    tracing::debug!(?config, "loaded configuration");

    let answers = build_answers(&config)?;
    if !answers.has_backend() && !cli.yes && !confirm_without_backend()? {
        return Ok(());
    }

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(4);
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, stopping after the current step");
            let _ = ctrl_c_tx.send(()).await;
        }
    });

    let settings = OrchestratorConfig {
        capture_duration: config.voice.capture_duration,
        transcription_failure_threshold: config.session.transcription_failure_threshold,
        answer_failure_threshold: config.session.answer_failure_threshold,
        max_turns: config.session.max_turns,
        greeting: Some(WELCOME.to_string()),
    };

    tracing::info!(
        text_mode = cli.text,
        backend = answers.has_backend(),
        providers = ?answers.providers().provider_names(),
        "voice assistant ready"
    );

    let summary = if cli.text {
        let transcriber = ConsoleTranscriber::new(shutdown_tx);
        Orchestrator::new(transcriber, ConsoleSpeaker, answers, settings)
            .run(&mut shutdown_rx)
            .await
    } else {
        let transcriber = MicrophoneTranscriber::new(build_whisper(&config)?);
        let speaker = build_speaker(&config)?;
        Orchestrator::new(transcriber, speaker, answers, settings)
            .run(&mut shutdown_rx)
            .await
    };

    println!(
        "Session {} ended after {} turns ({:.0?}).",
        summary.id, summary.turns, summary.duration
    );
    Ok(())
}

/// Ask whether to continue with fallback answers only
fn confirm_without_backend() -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() {
        tracing::warn!("no OPENAI_API_KEY set, answering from local fallback only");
        return Ok(true);
    }

    let proceed = dialoguer::Confirm::new()
        .with_prompt("No OPENAI_API_KEY is set. Continue with basic offline answers?")
        .default(true)
        .interact()?;
    Ok(proceed)
}

/// Provider chain in priority order: MCP server first, then GraphQL
fn build_providers(config: &Config) -> anyhow::Result<ProviderChain> {
    let platform = &config.platform;
    let mut chain = ProviderChain::new();

    if let Some(ttl) = platform.cache_ttl {
        chain = chain.with_cache(ttl);
    }
    if platform.mcp_enabled {
        chain = chain.with_provider(Box::new(McpProvider::new(
            platform.mcp_command.clone(),
            platform.site,
            platform.mcp_startup_timeout,
            platform.request_timeout,
        )));
    }

    Ok(chain.with_provider(Box::new(GraphqlProvider::new(
        platform.site,
        platform.request_timeout,
    )?)))
}

fn build_answers(config: &Config) -> anyhow::Result<AnswerGenerator> {
    let backend: Option<Box<dyn LanguageModel>> = match &config.backend.api_key {
        Some(key) => Some(Box::new(
            OpenAiBackend::new(
                key,
                &config.backend.base_url,
                config.backend.model.clone(),
                config.backend.timeout,
            )?
            .with_sampling(config.backend.max_tokens, config.backend.temperature),
        )),
        None => None,
    };

    Ok(AnswerGenerator::new(backend, build_providers(config)?)
        .with_credential(config.platform.credential.clone())
        .with_username(config.platform.username.clone()))
}

fn build_whisper(config: &Config) -> anyhow::Result<WhisperClient> {
    Ok(WhisperClient::new(
        &config.backend.base_url,
        config.voice.stt_base_url.as_deref(),
        config.backend.api_key.as_ref(),
        config.voice.whisper_model,
    )?)
}

fn build_speaker(config: &Config) -> anyhow::Result<Box<dyn SynthesisPort>> {
    match config.voice.tts {
        TtsBackend::OpenAi => {
            let key = config.backend.api_key.as_ref().ok_or_else(|| {
                anyhow::anyhow!("OpenAI TTS needs OPENAI_API_KEY (or set VOICE_QA_TTS=system)")
            })?;
            Ok(Box::new(OpenAiSpeaker::new(
                key,
                &config.backend.base_url,
                config.voice.tts_model.clone(),
                config.voice.tts_voice.clone(),
                config.voice.tts_speed,
            )?))
        }
        TtsBackend::System => Ok(Box::new(SystemSpeaker::detect(config.voice.speech_rate)?)),
    }
}

/// Answer one question
async fn ask(overrides: &Overrides, question: &str, speak: bool) -> anyhow::Result<()> {
    let config = Config::load(overrides)?;
    let answers = build_answers(&config)?;

    let answer = answers.generate(question).await;
    println!("{}", answer.text());
    if let Answer::Degraded { reason, .. } = &answer {
        println!("(degraded: {reason:?})");
    }
    if let Some(provider) = answers.providers().last_source() {
        println!("(LeetCode data from {provider})");
    }

    if speak {
        build_speaker(&config)?.speak(answer.text().as_str()).await?;
    }
    Ok(())
}

/// Resolve a lookup through provider selection
async fn lookup(overrides: &Overrides, target: &str) -> anyhow::Result<()> {
    let config = Config::load(overrides)?;
    let chain = build_providers(&config)?;
    let query = ProblemQuery::parse(target);

    println!("Looking up {query} via {:?}...", chain.provider_names());

    match chain
        .lookup(&query, config.platform.credential.as_ref())
        .await
    {
        ProviderLookup::Found { data, provider } => {
            println!("[{provider}] {}", data.summary());
        }
        ProviderLookup::Unavailable {
            anonymous_only,
            attempts,
        } => {
            for (provider, kind) in &attempts {
                println!("  {provider}: {kind} error");
            }
            if anonymous_only {
                println!("The LeetCode session was rejected; check LEETCODE_SESSION.");
            }
            anyhow::bail!("no provider could answer {query}");
        }
    }
    Ok(())
}

/// Speak a line, answer a fixed question, then listen for three seconds
async fn check(overrides: &Overrides) -> anyhow::Result<()> {
    let config = Config::load(overrides)?;

    println!("1. Speech output");
    let speaker = build_speaker(&config)?;
    match speaker.speak("Testing voice assistant components.").await {
        Ok(()) => println!("   ok"),
        Err(e) => println!("   failed: {e}"),
    }

    println!("2. Answering");
    let answers = build_answers(&config)?;
    let answer = answers.generate("Hello, can you hear me?").await;
    let source = if answer.backend_failed() {
        "fallback"
    } else {
        "backend"
    };
    println!("   {} ({source})", answer.text());

    println!("3. Speech input (speak now for 3 seconds)");
    let transcriber = MicrophoneTranscriber::new(build_whisper(&config)?);
    let heard = match transcriber.capture(Duration::from_secs(3)).await {
        Ok(sample) => transcriber.transcribe(sample).await,
        Err(e) => Err(e),
    };
    match heard {
        Ok(text) => println!("   heard: {text}"),
        Err(e) => println!("   failed: {e}"),
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", SAMPLE_RATE);
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let second = AudioSample::new(capture.peek_buffer(), SAMPLE_RATE);
        let energy = second.rms();
        let peak = second.samples().iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);

        capture.clear_buffer();
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24000_u16;
    let frequency = 440.0_f32;
    let samples: Vec<f32> = (0..u32::from(sample_rate) * 2)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / f32::from(sample_rate);
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());
    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play(samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test the configured speech synthesizer
async fn test_tts(overrides: &Overrides, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load(overrides)?;
    let speaker = build_speaker(&config)?;
    speaker.speak(text).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");
    Ok(())
}

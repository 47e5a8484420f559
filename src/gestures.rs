use std::future::Future;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines, Stdin};
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Swipe down
    Exit,
    /// Swipe left
    NextPage,
    /// Swipe right
    PreviousPage,
    /// Tap
    Refresh,
}

#[derive(thiserror::Error, Debug)]
#[error("unknown gesture {0:?}")]
pub struct UnknownGesture(pub String);

impl FromStr for Gesture {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "tap" | "t" | "r" | "refresh" => Ok(Gesture::Refresh),
            "swipeleft" | "left" | "n" | "next" => Ok(Gesture::NextPage),
            "swiperight" | "right" | "p" | "prev" | "previous" => Ok(Gesture::PreviousPage),
            "swipedown" | "down" | "q" | "exit" | "quit" => Ok(Gesture::Exit),
            _ => Err(UnknownGesture(s.to_string())),
        }
    }
}

pub trait GestureSource {
    /// The next gesture, `None` once the source is exhausted
    fn next_gesture(&mut self) -> impl Future<Output = Option<Gesture>>;
}

/// Reads one gesture per line
pub struct LineGestures<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> LineGestures<R> {
    pub fn new(reader: R) -> Self {
        LineGestures {
            lines: BufReader::new(reader).lines(),
        }
    }
}

impl LineGestures<Stdin> {
    pub fn stdin() -> Self {
        LineGestures::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin> GestureSource for LineGestures<R> {
    async fn next_gesture(&mut self) -> Option<Gesture> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => match line.parse() {
                    Ok(gesture) => return Some(gesture),
                    Err(err) => warn!("{err}"),
                },
                Ok(None) => return None,
                Err(err) => {
                    error!("couldn't read gestures: {err}");
                    return None;
                }
            }
        }
    }
}

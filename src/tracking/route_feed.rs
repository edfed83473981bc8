use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::geo::route::TRACKING_TICK;
use crate::geo::{GeoPoint, RoutePath};

/// Drives a [`RoutePath`] on a periodic timer, one position per tick.
///
/// The source position is emitted immediately, then one point every
/// `TRACKING_TICK` until the destination. The backing task stops at the
/// first failed send, so dropping the returned stream (the tracking view
/// closing) cancels the timer. One feed per view; nothing outside the
/// stream observes it.
pub fn spawn_route_feed(path: RoutePath) -> ReceiverStream<GeoPoint> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TRACKING_TICK);
        for point in path {
            // First tick completes immediately
            ticker.tick().await;
            if tx.send(point).await.is_err() {
                // Viewer disconnected
                break;
            }
        }
    });

    ReceiverStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    const SOURCE: GeoPoint = GeoPoint {
        lat: 33.9716,
        lng: -6.8498,
    };
    const DEST: GeoPoint = GeoPoint {
        lat: 34.0531,
        lng: -6.7985,
    };

    #[tokio::test(start_paused = true)]
    async fn feed_runs_source_to_destination() {
        let path = RoutePath::with_steps(SOURCE, DEST, 4);
        let points: Vec<GeoPoint> = spawn_route_feed(path).collect().await;

        assert_eq!(points.len(), 5);
        assert_eq!(points[0], SOURCE);
        assert_eq!(points[4], DEST);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_stream_stops_the_feed() {
        let path = RoutePath::with_steps(SOURCE, DEST, 4);
        let mut stream = spawn_route_feed(path);

        assert_eq!(stream.next().await, Some(SOURCE));
        drop(stream);
        // The backing task exits on its next send; nothing to assert
        // beyond not hanging.
        tokio::task::yield_now().await;
    }
}

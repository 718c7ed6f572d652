use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
///
/// Detection boxes are stored normalized to [0,1] by video width/height.
/// Use [`BoundingBox::to_pixels`] where a computation needs absolute distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Centroid as (x, y)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Whether the box satisfies `x_min <= x_max` and `y_min <= y_max`
    pub fn is_valid(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }

    /// Componentwise min/max of two boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Linear interpolation of each coordinate independently
    ///
    /// Both inputs are valid boxes and `t` lies in [0,1], so the result is valid too.
    pub fn lerp(&self, other: &BoundingBox, t: f64) -> BoundingBox {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        BoundingBox {
            x_min: mix(self.x_min, other.x_min),
            y_min: mix(self.y_min, other.y_min),
            x_max: mix(self.x_max, other.x_max),
            y_max: mix(self.y_max, other.y_max),
        }
    }

    /// Scale a normalized box to pixel space
    pub fn to_pixels(&self, video: &VideoMetadata) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min * video.width,
            y_min: self.y_min * video.height,
            x_max: self.x_max * video.width,
            y_max: self.y_max * video.height,
        }
    }

    /// Intersection over union, 0 when the union is empty
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix = (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0);
        let iy = (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Euclidean distance between centroids
    pub fn centroid_distance(&self, other: &BoundingBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }
}

/// Video properties, immutable for the lifetime of a loaded video
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Frame width in pixels
    pub width: f64,

    /// Frame height in pixels
    pub height: f64,

    /// Frames per second
    pub fps: f64,

    /// Number of frames covered by the detection run
    pub total_frames: u32,
}

impl VideoMetadata {
    pub fn duration_secs(&self) -> f64 {
        self.total_frames as f64 / self.fps
    }
}

/// Enclosure bounding box in pixel coordinates plus the dividing line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankGeometry {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,

    /// Boundary/mirror line separating the two sides
    pub center_x: f64,
}

impl TankGeometry {
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Vertical midpoint of the tank (T/B zone boundary)
    pub fn center_y(&self) -> f64 {
        (self.y_min + self.y_max) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_box() {
        let a = BoundingBox::new(0.1, 0.2, 0.3, 0.4);
        let b = BoundingBox::new(0.2, 0.1, 0.5, 0.3);
        assert_eq!(a.union(&b), BoundingBox::new(0.1, 0.1, 0.5, 0.4));
    }

    #[test]
    fn test_iou() {
        let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BoundingBox::new(1.0, 1.0, 3.0, 3.0);
        // intersection 1, union 7
        assert!((a.iou(&b) - 1.0 / 7.0).abs() < 1e-12);
        assert!((a.iou(&a) - 1.0).abs() < 1e-12);

        let far = BoundingBox::new(5.0, 5.0, 6.0, 6.0);
        assert_eq!(a.iou(&far), 0.0);

        let point = BoundingBox::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(point.iou(&point), 0.0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
        let b = BoundingBox::new(0.5, 0.5, 0.7, 0.7);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.x_min - 0.25).abs() < 1e-12);
        assert!((mid.x_max - 0.45).abs() < 1e-12);
        assert!(mid.is_valid());
    }

    #[test]
    fn test_to_pixels() {
        let video = VideoMetadata {
            width: 1920.0,
            height: 1080.0,
            fps: 30.0,
            total_frames: 300,
        };
        let px = BoundingBox::new(0.5, 0.5, 1.0, 1.0).to_pixels(&video);
        assert_eq!(px, BoundingBox::new(960.0, 540.0, 1920.0, 1080.0));
    }
}

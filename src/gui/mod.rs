mod worker;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::Receiver;
use iced::widget::{Column, Row, button, pick_list, scrollable, text, text_input};
use iced::{Element, Length, Subscription, Task};

use crate::config::{ComputeType, Device, ModelSize, Settings};
use crate::output;
use worker::WorkerMessage;

pub fn run(settings: Settings) -> iced::Result {
    iced::application("Quickscribe", App::update, App::view)
        .subscription(App::subscription)
        .window_size(iced::Size::new(760.0, 600.0))
        .run_with(move || (App::new(settings), Task::none()))
}

struct App {
    settings: Settings,
    audio_path: Option<PathBuf>,
    save_path: String,
    transcript: String,
    status: String,
    job: Option<Receiver<WorkerMessage>>,
}

#[derive(Debug, Clone)]
enum Message {
    SelectAudio,
    AudioSelected(Option<PathBuf>),
    ModelChanged(ModelSize),
    DeviceChanged(Device),
    ComputeChanged(ComputeType),
    SavePathChanged(String),
    Transcribe,
    Save,
    Poll,
}

impl App {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            audio_path: None,
            save_path: String::new(),
            transcript: String::new(),
            status: String::new(),
            job: None,
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectAudio => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select audio file")
                            .add_filter(
                                "Audio Files",
                                &["mp3", "wav", "m4a", "flac", "ogg", "mp4", "mkv", "webm"],
                            )
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::AudioSelected,
                );
            }
            Message::AudioSelected(Some(path)) => {
                self.audio_path = Some(path);
                self.status.clear();
            }
            Message::AudioSelected(None) => {}
            Message::ModelChanged(model) => {
                self.settings.model = model;
            }
            Message::DeviceChanged(device) => {
                self.settings.device = device;
            }
            Message::ComputeChanged(compute) => {
                self.settings.compute_type = compute;
            }
            Message::SavePathChanged(path) => {
                self.save_path = path;
            }
            Message::Transcribe => {
                if self.job.is_some() {
                    return Task::none();
                }
                let Some(audio_path) = self.audio_path.clone() else {
                    self.status = "Select an audio file first".to_string();
                    return Task::none();
                };
                self.transcript.clear();
                self.status = "Loading model...".to_string();
                self.job = Some(worker::spawn(worker::JobParams {
                    audio_path,
                    settings: self.settings.clone(),
                }));
            }
            Message::Save => {
                if self.transcript.is_empty() {
                    self.status = "Nothing to save yet".to_string();
                } else if self.save_path.trim().is_empty() {
                    self.status = "Enter a save path first".to_string();
                } else {
                    match output::save_text(Path::new(self.save_path.trim()), &self.transcript) {
                        Ok(()) => {
                            self.status = format!("Transcription saved to: {}", self.save_path)
                        }
                        Err(e) => self.status = format!("Error saving transcription: {}", e),
                    }
                }
            }
            Message::Poll => {
                let mut messages = Vec::new();
                if let Some(rx) = &self.job {
                    while let Ok(msg) = rx.try_recv() {
                        messages.push(msg);
                    }
                }
                let mut finished = false;
                for msg in messages {
                    match msg {
                        WorkerMessage::DownloadProgress(downloaded, total) => {
                            self.status = match total {
                                Some(total) if total > 0 => format!(
                                    "Downloading model... {}%",
                                    downloaded * 100 / total
                                ),
                                _ => format!(
                                    "Downloading model... {:.1} MB",
                                    downloaded as f64 / 1_048_576.0
                                ),
                            };
                        }
                        WorkerMessage::TranscribeProgress(progress) => {
                            self.status = format!("Transcribing... {}%", progress);
                        }
                        WorkerMessage::Done(segments) => {
                            self.transcript = output::render(&segments);
                            self.status = "Transcription completed!".to_string();
                            finished = true;
                        }
                        WorkerMessage::Error(e) => {
                            self.status = format!("An error occurred: {}", e);
                            finished = true;
                        }
                    }
                }
                if finished {
                    self.job = None;
                }
            }
        }

        Task::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.job.is_some() {
            iced::time::every(Duration::from_millis(100)).map(|_| Message::Poll)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let file_label = self
            .audio_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "No file selected".to_string());

        let file_row = Row::new()
            .spacing(10)
            .push(button("Upload Audio").on_press(Message::SelectAudio))
            .push(text(file_label));

        let controls = Row::new()
            .spacing(10)
            .push(pick_list(
                ModelSize::ALL,
                Some(self.settings.model),
                Message::ModelChanged,
            ))
            .push(pick_list(
                Device::ALL,
                Some(self.settings.device),
                Message::DeviceChanged,
            ))
            .push(pick_list(
                ComputeType::ALL,
                Some(self.settings.compute_type),
                Message::ComputeChanged,
            ));

        let actions = Row::new()
            .spacing(10)
            .push(
                button("Transcribe")
                    .on_press_maybe(self.job.is_none().then_some(Message::Transcribe)),
            )
            .push(button("Save Transcription").on_press(Message::Save))
            .push(
                text_input("Enter path to save transcription (e.g. output.txt)", &self.save_path)
                    .on_input(Message::SavePathChanged)
                    .width(Length::Fill),
            );

        let transcript = scrollable(text(self.transcript.as_str()))
            .width(Length::Fill)
            .height(Length::Fill);

        Column::new()
            .spacing(12)
            .padding(16)
            .push(text("Audio Transcription").size(24))
            .push(file_row)
            .push(controls)
            .push(actions)
            .push(transcript)
            .push(text(self.status.as_str()))
            .into()
    }
}
